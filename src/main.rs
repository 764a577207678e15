mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;
mod ytdlp;

use iced::{window, Size};

const ICON_SIZE: u32 = 64;

/// Red rounded square with a white play triangle
fn window_icon() -> Option<window::Icon> {
    let img = image::RgbaImage::from_fn(ICON_SIZE, ICON_SIZE, |x, y| {
        let (fx, fy) = (x as f32, y as f32);
        let center = ICON_SIZE as f32 / 2.0;

        // corners
        let r = 12.0;
        let cx = fx.clamp(r, ICON_SIZE as f32 - 1.0 - r);
        let cy = fy.clamp(r, ICON_SIZE as f32 - 1.0 - r);
        if (fx - cx).powi(2) + (fy - cy).powi(2) > r * r {
            return image::Rgba([0, 0, 0, 0]);
        }

        let in_triangle = fx >= 24.0 && fx <= 44.0 && (fy - center).abs() <= (44.0 - fx) * 0.6;
        if in_triangle {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([220, 30, 30, 255])
        }
    });

    let (width, height) = img.dimensions();
    window::icon::from_rgba(img.into_raw(), width, height).ok()
}

fn main() -> iced::Result {
    utils::init_tracing();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("YouTube Downloader")
        .theme(app::theme)
        .window(window::Settings {
            icon: window_icon(),
            size: Size::new(600.0, 460.0),
            ..Default::default()
        })
        .run()
}
