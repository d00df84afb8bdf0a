//! Battery charge bar.

use std::rc::Rc;

use ricebar_runtime::{Binding, Computed, Subscription, Teardown};
use ricebar_services::battery::{self, BatteryService};

use crate::error::{Result, WidgetError};
use crate::widget::{Widget, watch_all};

/// Width of the charge bar in pixels.
pub const DEFAULT_WIDTH: f64 = 175.0;
pub const TOOLTIP: &str = "Battery";

/// Charge fraction limited to `0.0..=1.0`; NaN reads as empty.
fn charge(percentage: f64) -> f64 {
    if percentage.is_nan() { 0.0 } else { percentage.clamp(0.0, 1.0) }
}

/// `"Stored: N%"` for a charge fraction, rounded down.
#[must_use]
pub fn stored_label(percentage: f64) -> String {
    let percent = (charge(percentage) * 100.0).floor() as u32;
    format!("Stored: {percent}%")
}

/// Width of the filled part of a bar `width` wide.
#[must_use]
pub fn progress_width(percentage: f64, width: f64) -> f64 {
    charge(percentage) * width
}

/// Charge label, fill width, and charging stripes.
#[derive(Debug, Clone)]
pub struct Battery {
    present: Binding<bool>,
    percentage: Binding<f64>,
    charging: Binding<bool>,
    label: Computed<String>,
    progress: Computed<f64>,
}

impl Battery {
    pub fn new(service: &Rc<dyn BatteryService>, width: f64) -> Result<Self> {
        if !(width.is_finite() && width > 0.0) {
            return Err(WidgetError::InvalidWidth { width });
        }
        let percentage = Binding::new(service, battery::PERCENTAGE);
        let label = Computed::from1(&percentage, |p| stored_label(p.unwrap_or(0.0)));
        let progress = Computed::from1(&percentage, move |p| {
            progress_width(p.unwrap_or(0.0), width)
        });
        Ok(Self {
            present: Binding::new(service, battery::IS_PRESENT),
            charging: Binding::map(service, battery::STATE, |s| s.is_charging()),
            percentage,
            label,
            progress,
        })
    }

    /// Whether a battery exists at all.
    #[must_use]
    pub fn visible(&self) -> bool {
        self.present.get_or(false)
    }

    #[must_use]
    pub fn label(&self) -> String {
        self.label.get()
    }

    #[must_use]
    pub fn progress(&self) -> f64 {
        self.progress.get()
    }

    #[must_use]
    pub fn charging(&self) -> bool {
        self.charging.get_or(false)
    }

    #[must_use]
    pub fn percentage(&self) -> &Binding<f64> {
        &self.percentage
    }
}

impl Teardown for Battery {
    fn teardown(&self) {
        self.label.dispose();
        self.progress.dispose();
        self.percentage.dispose();
        self.charging.dispose();
        self.present.dispose();
    }
}

impl Widget for Battery {
    fn name(&self) -> &'static str {
        "battery"
    }

    fn snapshot(&self) -> String {
        format!(
            "{} fill={:.1} charging={} visible={}",
            self.label(),
            self.progress(),
            self.charging(),
            self.visible()
        )
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Vec<Subscription> {
        watch_all(
            &[&self.label, &self.progress, &self.charging, &self.present],
            &on_change,
        )
    }
}
