use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

fn download_style() -> ProgressStyle {
    ProgressStyle::with_template(
        "{spinner:.green} {msg}\n[{elapsed_precise}] [{bar:40.green/white}] {bytes}/{total_bytes} @ {bytes_per_sec}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("=> ")
}

fn unsized_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {bytes} @ {bytes_per_sec}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Progress display for a single transfer. A disabled instance does nothing.
pub struct DownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress {
    pub fn new(name: &str, total: Option<u64>, enabled: bool) -> Self {
        if !enabled {
            return Self::disabled();
        }

        let bar = match total {
            Some(total) if total > 0 => {
                let bar = ProgressBar::new(total);
                bar.set_style(download_style());
                bar
            }
            _ => {
                let bar = ProgressBar::no_length();
                bar.set_style(unsized_style());
                bar
            }
        };
        bar.set_message(format!("Fetching {name}"));
        bar.enable_steady_tick(Duration::from_millis(500));

        Self { bar: Some(bar) }
    }

    pub fn disabled() -> Self {
        Self { bar: None }
    }

    pub fn update(&self, done: u64, total: Option<u64>) {
        let Some(bar) = &self.bar else {
            return;
        };
        if let Some(total) = total.filter(|t| *t > 0) {
            if bar.length() != Some(total) {
                bar.set_style(download_style());
                bar.set_length(total);
            }
        }
        bar.set_position(done);
    }

    pub fn finish(&self, message: String) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message(message);
        }
    }

    pub fn abandon(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }
}
