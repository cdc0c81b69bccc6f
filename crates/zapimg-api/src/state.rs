//! Application state
//!
//! One state object, passed by `Arc` into every handler. Session state is
//! never ambient: handlers reach sessions only through the
//! [`SessionContext`](crate::session::SessionContext) extractor, which
//! carries a reference to the store held here.

use std::sync::Arc;
use std::time::Duration;

use zapimg_core::Config;
use zapimg_payments::PaymentVerifier;
use zapimg_processing::{GifTranscoder, VideoProbe};
use zapimg_storage::Storage;

use crate::session::SessionStore;

pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub payments: PaymentVerifier,
    pub sessions: Arc<SessionStore>,
    pub transcoder: GifTranscoder,
    pub probe: VideoProbe,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        payments: PaymentVerifier,
        sessions: Arc<SessionStore>,
    ) -> Self {
        let transcode_timeout = Duration::from_secs(config.transcode_timeout_secs);
        let transcoder = GifTranscoder::new(config.ffmpeg_path.clone(), transcode_timeout);
        let probe = VideoProbe::new(config.ffprobe_path.clone(), transcode_timeout);

        AppState {
            config,
            storage,
            payments,
            sessions,
            transcoder,
            probe,
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
