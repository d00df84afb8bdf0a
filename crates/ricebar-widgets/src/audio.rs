//! Speaker volume.

use std::rc::Rc;

use ricebar_runtime::{Binding, Subscription, Teardown};
use ricebar_services::audio::{self, AudioService, Speaker};

use crate::widget::{Widget, watch_all};

/// Volume icon with a slider in its popover.
#[derive(Clone)]
pub struct Audio {
    speaker: Rc<dyn Speaker>,
    volume: Binding<f64>,
    icon: Binding<String>,
}

impl Audio {
    #[must_use]
    pub fn new(service: &Rc<dyn AudioService>) -> Self {
        let speaker = service.default_speaker();
        Self {
            volume: Binding::new(&speaker, audio::VOLUME),
            icon: Binding::new(&speaker, audio::VOLUME_ICON),
            speaker,
        }
    }

    #[must_use]
    pub fn volume(&self) -> f64 {
        self.volume.get_or(0.0)
    }

    #[must_use]
    pub fn icon(&self) -> String {
        self.icon.get().unwrap_or_default()
    }

    /// Move the slider. The shown volume follows once the speaker reports it.
    pub fn set_volume(&self, volume: f64) {
        if !volume.is_finite() {
            return;
        }
        self.speaker.set_volume(volume.clamp(0.0, 1.0));
    }
}

impl Teardown for Audio {
    fn teardown(&self) {
        self.volume.dispose();
        self.icon.dispose();
    }
}

impl Widget for Audio {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn snapshot(&self) -> String {
        format!("{} {:.0}%", self.icon(), self.volume() * 100.0)
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(&[&self.volume, &self.icon], &on_change)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricebar_services::testing::FakeAudio;

    fn widget() -> (Rc<FakeAudio>, Audio) {
        let fake = FakeAudio::new(0.5);
        let service: Rc<dyn AudioService> = fake.clone();
        (fake, Audio::new(&service))
    }

    #[test]
    fn shows_volume_and_icon() {
        let (_fake, widget) = widget();
        assert_eq!(widget.snapshot(), "audio-volume-medium-symbolic 50%");
    }

    #[test]
    fn slider_drives_the_speaker() {
        let (fake, widget) = widget();
        widget.set_volume(1.4);
        assert_eq!(fake.speaker().volume(), 1.0);
        assert_eq!(widget.volume(), 1.0);
        assert_eq!(widget.icon(), "audio-volume-high-symbolic");
    }

    #[test]
    fn non_finite_volume_is_ignored() {
        let (fake, widget) = widget();
        widget.set_volume(f64::NAN);
        assert_eq!(fake.speaker().volume(), 0.5);
    }
}
