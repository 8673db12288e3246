use crate::capture_classifier::core::Event;
use crate::capture_classifier::render::{Screen, ViewModel};
use crate::device_camera::interface::CapturedImage;
use crate::display::interface::Display;
use crate::library::logger::interface::Logger;
use std::error::Error;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Publishes view models to a shared slot read by [`CaptureWindow`].
pub struct DisplayGui {
    view: Arc<Mutex<ViewModel>>,
}

impl DisplayGui {
    pub fn new(view: Arc<Mutex<ViewModel>>) -> Self {
        Self { view }
    }
}

impl Display for DisplayGui {
    fn show(&self, view: &ViewModel) -> Result<(), Box<dyn Error + Send + Sync>> {
        *self
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = view.clone();
        Ok(())
    }
}

struct Thumbnail {
    image: CapturedImage,
    texture: Option<egui::TextureHandle>,
}

pub struct CaptureWindow {
    view: Arc<Mutex<ViewModel>>,
    event_sender: Sender<Event>,
    logger: Arc<dyn Logger + Send + Sync>,
    thumbnail_size: u32,
    thumbnail: Option<Thumbnail>,
}

impl CaptureWindow {
    pub fn new(
        view: Arc<Mutex<ViewModel>>,
        event_sender: Sender<Event>,
        logger: Arc<dyn Logger + Send + Sync>,
        thumbnail_size: u32,
    ) -> Self {
        Self {
            view,
            event_sender,
            logger: logger.with_namespace("display").with_namespace("gui"),
            thumbnail_size,
            thumbnail: None,
        }
    }

    /// Blocks until the window is closed.
    pub fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([480.0, 720.0])
                .with_title("Capture Classifier"),
            ..Default::default()
        };

        eframe::run_native(
            "Capture Classifier",
            options,
            Box::new(move |_cc| Box::new(self)),
        )
        .map_err(|e| e.to_string().into())
    }

    fn send(&self, event: Event) {
        if self.event_sender.send(event).is_err() {
            let _ = self.logger.warn("Pipeline is no longer listening");
        }
    }

    fn sync_thumbnail(&mut self, ctx: &egui::Context, captured: Option<&CapturedImage>) {
        let Some(captured) = captured else {
            self.thumbnail = None;
            return;
        };
        if self.thumbnail.as_ref().map(|t| &t.image) == Some(captured) {
            return;
        }

        let texture = match load_thumbnail(captured, self.thumbnail_size) {
            Ok(color_image) => Some(ctx.load_texture(
                "thumbnail",
                color_image,
                egui::TextureOptions::default(),
            )),
            Err(e) => {
                let _ = self
                    .logger
                    .error(&format!("Thumbnail for {} failed: {}", captured.uri, e));
                None
            }
        };

        self.thumbnail = Some(Thumbnail {
            image: captured.clone(),
            texture,
        });
    }

    fn permission_request(&self, ui: &mut egui::Ui, requesting: bool) {
        ui.vertical_centered(|ui| {
            ui.add_space(40.0);
            ui.label("We need your permission to show the camera");
            ui.add_space(10.0);
            if ui
                .add_enabled(!requesting, egui::Button::new("Grant permission"))
                .clicked()
            {
                self.send(Event::RequestPermissionPressed);
            }
        });
    }

    fn camera(&self, ui: &mut egui::Ui, view: &ViewModel) {
        ui.vertical_centered(|ui| {
            let width = ui.available_width();
            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(width, ui.available_height() * 0.7),
                egui::Sense::hover(),
            );
            ui.painter()
                .rect_filled(rect, 4.0, egui::Color32::from_rgb(30, 30, 30));
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Viewfinder",
                egui::FontId::proportional(18.0),
                egui::Color32::GRAY,
            );

            ui.add_space(8.0);
            if ui
                .add_enabled(view.can_capture(), egui::Button::new("Take picture"))
                .clicked()
            {
                self.send(Event::CapturePressed);
            }
            ui.add_space(8.0);

            if let Some(texture) = self.thumbnail.as_ref().and_then(|t| t.texture.as_ref()) {
                let size = self.thumbnail_size as f32;
                ui.image((texture.id(), egui::vec2(size, size)));
            }

            ui.horizontal(|ui| {
                if view.busy {
                    ui.spinner();
                }
                ui.label(egui::RichText::new(&view.status_text).size(18.0));
            });

            if let Some(error) = &view.error {
                ui.colored_label(egui::Color32::from_rgb(200, 60, 60), error);
                if ui.button("Retry").clicked() {
                    self.send(Event::RetryPressed);
                }
            }
        });
    }
}

fn load_thumbnail(
    captured: &CapturedImage,
    size: u32,
) -> Result<egui::ColorImage, Box<dyn Error + Send + Sync>> {
    let bytes = std::fs::read(captured.path())?;
    let thumbnail = image::load_from_memory(&bytes)?.thumbnail(size, size);
    let rgba = thumbnail.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        [rgba.width() as usize, rgba.height() as usize],
        rgba.as_raw(),
    ))
}

impl eframe::App for CaptureWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let view = self
            .view
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        self.sync_thumbnail(ctx, view.thumbnail.as_ref());

        egui::CentralPanel::default().show(ctx, |ui| match &view.screen {
            Screen::PermissionLoading => {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.label("Loading");
                });
            }
            Screen::PermissionRequest { requesting } => self.permission_request(ui, *requesting),
            Screen::Camera => self.camera(ui, &view),
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_show_publishes_latest_view() {
        let slot = Arc::new(Mutex::new(ViewModel::default()));
        let display = DisplayGui::new(slot.clone());
        let view = ViewModel {
            screen: Screen::Camera,
            status_text: "tabby cat (0.842)".to_string(),
            ..ViewModel::default()
        };

        display.show(&view).unwrap();

        assert_eq!(*slot.lock().unwrap(), view);
    }

    #[test]
    fn test_thumbnail_fits_requested_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.png");
        DynamicImage::ImageRgb8(RgbImage::new(400, 200))
            .save(&path)
            .unwrap();

        let thumbnail = load_thumbnail(&CapturedImage::from_path(&path), 100).unwrap();

        assert_eq!(thumbnail.size, [100, 50]);
    }
}
