use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::data::io::expand_output_path;
use crate::utils::Histogram;
use crate::{DimuError, DimuResult};

/// Options controlling the appearance of a rendered histogram
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlotOptions {
    /// The caption drawn above the plot
    pub title: String,
    /// The x-axis label
    pub x_label: String,
    /// The y-axis label
    pub y_label: String,
    /// Draw the y-axis with a logarithmic scale
    pub log_scale: bool,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            title: "Invariant Mass".to_string(),
            x_label: "Invariant Mass [GeV]".to_string(),
            y_label: "Number of particles".to_string(),
            log_scale: false,
            width: 800,
            height: 600,
        }
    }
}

fn map_plot_error<E: std::fmt::Display>(err: E) -> DimuError {
    DimuError::PlotError(err.to_string())
}

/// Render a [`Histogram`] as a bar chart and write it to a raster image file.
///
/// The output format is determined by the file extension (PNG unless the backend recognises
/// another raster format).
pub fn render_histogram(
    histogram: &Histogram,
    file_path: &str,
    options: &PlotOptions,
) -> DimuResult<()> {
    let path = expand_output_path(file_path)?;
    let (x_lo, x_hi) = histogram.range();
    let y_max = (histogram.max_count() * 1.1).max(1.0);

    let root = BitMapBackend::new(&path, (options.width, options.height)).into_drawing_area();
    root.fill(&WHITE).map_err(map_plot_error)?;

    if options.log_scale {
        // a log axis cannot start at zero; a floor below one count keeps empty bins visible
        let y_floor = 0.7;
        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, (y_floor..y_max).log_scale())
            .map_err(map_plot_error)?;
        chart
            .configure_mesh()
            .x_desc(options.x_label.as_str())
            .y_desc(options.y_label.as_str())
            .draw()
            .map_err(map_plot_error)?;
        for (i, &count) in histogram.counts.iter().enumerate() {
            let x0 = histogram.bin_edges[i];
            let x1 = histogram.bin_edges[i + 1];
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x0, y_floor), (x1, count.max(y_floor))],
                    BLUE.mix(0.6).filled(),
                )))
                .map_err(map_plot_error)?;
        }
    } else {
        let mut chart = ChartBuilder::on(&root)
            .caption(&options.title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_max)
            .map_err(map_plot_error)?;
        chart
            .configure_mesh()
            .x_desc(options.x_label.as_str())
            .y_desc(options.y_label.as_str())
            .draw()
            .map_err(map_plot_error)?;
        for (i, &count) in histogram.counts.iter().enumerate() {
            let x0 = histogram.bin_edges[i];
            let x1 = histogram.bin_edges[i + 1];
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x0, 0.0), (x1, count)],
                    BLUE.mix(0.6).filled(),
                )))
                .map_err(map_plot_error)?;
        }
    }

    root.present().map_err(map_plot_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_histogram() -> Histogram {
        let mut histogram = Histogram::new(10, (0.0, 10.0)).unwrap();
        for value in [0.5, 1.5, 1.6, 4.2, 9.9] {
            histogram.fill(value);
        }
        histogram
    }

    #[test]
    fn test_render_linear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mass.png");
        let histogram = sample_histogram();
        render_histogram(&histogram, path.to_str().unwrap(), &PlotOptions::default()).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }

    #[test]
    fn test_render_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mass_log.png");
        let histogram = sample_histogram();
        let options = PlotOptions {
            log_scale: true,
            ..Default::default()
        };
        render_histogram(&histogram, path.to_str().unwrap(), &options).unwrap();
        let metadata = std::fs::metadata(&path).unwrap();
        assert!(metadata.len() > 0);
    }
}
