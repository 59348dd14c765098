mod app;
mod chat_panel;
mod dom;
mod draw_panel;
mod export;
mod net;
mod palette;
mod render;
mod state;
mod toast;
mod upload_panel;
mod util;

pub use app::run;
