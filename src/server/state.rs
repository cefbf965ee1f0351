use crate::caption::Compositor;
use crate::settings;

pub struct ServerState {
    pub(crate) settings: settings::Settings,
    pub(crate) compositor: Compositor,
}

impl ServerState {
    pub fn new(settings: settings::Settings) -> Self {
        let compositor = Compositor::new(settings.font_path_buf().as_deref());
        Self {
            settings,
            compositor,
        }
    }
}
