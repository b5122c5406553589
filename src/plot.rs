use crate::config::{AxisPolicy, FeverConfig};
use crate::error::{FeverError, Result};
use crate::store::Table;
use crate::{fmt_temp, min_and_max, suitable_xfmt, FeverSeries};
use chrono::prelude::*;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// scratch file used when the chart is only shown, not kept
pub const SCRATCH_SVG: &str = "fever_chart.svg";

/// extra room above and below readings outside the configured axis
pub const Y_PADDING: f64 = 0.5;

const DARKBLUE: RGBColor = RGBColor(0, 0, 139);
const ALICEBLUE: RGBColor = RGBColor(240, 248, 255);

impl FeverSeries {
    /// y axis bounds: the configured range, widened to every reading under `AxisPolicy::Extend`
    pub fn y_range(&self, cfg: &FeverConfig) -> (f64, f64) {
        match (cfg.axis_policy, self.finite_range()) {
            (AxisPolicy::Extend, Some((lo, hi))) if lo < cfg.y_min || hi > cfg.y_max => {
                warn!(
                    min = lo,
                    max = hi,
                    "readings outside {}-{}°F, extending the axis",
                    cfg.y_min,
                    cfg.y_max
                );
                ((lo - Y_PADDING).min(cfg.y_min), (hi + Y_PADDING).max(cfg.y_max))
            }
            _ => (cfg.y_min, cfg.y_max),
        }
    }

    /// replaces the readings outside [y_min, y_max] with NAN
    pub fn clipped(&self, cfg: &FeverConfig) -> FeverSeries {
        let mut series = self.clone();
        let mut n = 0;
        for t in series.temperature.iter_mut() {
            if *t < cfg.y_min || *t > cfg.y_max {
                n += 1;
                *t = f64::NAN;
            }
        }
        if n > 0 {
            warn!(count = n, "clipped readings outside {}-{}°F", cfg.y_min, cfg.y_max);
        }
        series
    }

    /// text of the box highlighting the latest reading
    pub fn callout_text(&self) -> Option<String> {
        let (dt, t) = self.latest()?;
        Some(format!(
            "The latest temperature on {} at {} is: {}°F",
            dt.format("%d-%b-%Y"),
            dt.format("%I:%M %p"),
            fmt_temp(t)
        ))
    }

    /// Plots the temperature time series over the severity bands to svg.
    /// Under `AxisPolicy::Clip` only the line and markers drop the
    /// out-of-range readings, the callout always shows the latest reading.
    pub fn plot_datetime(&self, fout: &Path, cfg: &FeverConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let (xmindt, xmaxdt) = min_and_max(&self.time[..]).ok_or("no datetime to plot")?;
        let xspan: chrono::Duration = xmaxdt - xmindt;
        let xmargin: chrono::Duration = if xspan > chrono::Duration::zero() {
            xspan / 20
        } else {
            chrono::Duration::hours(1)
        };
        let xmin = Utc.from_utc_datetime(&(xmindt - xmargin));
        let xmax = Utc.from_utc_datetime(&(xmaxdt + xmargin));
        let xfmt = suitable_xfmt(xspan);
        let (ymin, ymax) = self.y_range(cfg);

        let root = SVGBackend::new(fout, (1400, 800)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Fever Temperature Graph",
                ("sans-serif", 36).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(100)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(200, 200, 200).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 18))
            .x_labels(10)
            .x_label_formatter(&|x: &DateTime<Utc>| x.format(xfmt).to_string())
            .y_label_formatter(&|y: &f64| format!("{:.1}", y))
            .x_desc("Date & Time")
            .y_desc("Temperature (°F)")
            .draw()?;

        // bands first so that they stay behind the line, highest first for the legend
        for band in cfg.bands.iter() {
            let lower = band.lower.unwrap_or(ymin).max(ymin);
            let upper = band.upper.min(ymax);
            if lower >= upper {
                continue;
            }
            let [r, g, b] = band.color;
            let style = RGBColor(r, g, b).mix(0.7).filled();
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(xmin, lower), (xmax, upper)],
                    style,
                )))?
                .label(band.legend_label())
                .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 20, y + 6)], style));
        }

        let drawn = match cfg.axis_policy {
            AxisPolicy::Clip => self.clipped(cfg),
            AxisPolicy::Extend => self.clone(),
        };
        let points: Vec<(DateTime<Utc>, f64)> = drawn
            .time
            .iter()
            .zip(drawn.temperature.iter())
            .map(|(x, y)| (Utc.from_utc_datetime(x), *y))
            .collect();
        // missing readings break the line
        for segment in points.split(|(_, y)| y.is_nan()) {
            if segment.is_empty() {
                continue;
            }
            chart.draw_series(LineSeries::new(
                segment.iter().copied(),
                DARKBLUE.stroke_width(3),
            ))?;
        }
        chart
            .draw_series(
                points
                    .iter()
                    .filter(|(_, y)| !y.is_nan())
                    .map(|&(x, y)| Circle::new((x, y), 6, DARKBLUE.filled())),
            )?
            .label("Your Temperature")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DARKBLUE.stroke_width(3)));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", 16))
            .draw()?;

        if let Some(text) = self.callout_text() {
            let (xr, yr) = chart.plotting_area().get_pixel_range();
            let style: TextStyle = ("sans-serif", 20).into_font().style(FontStyle::Bold).into();
            let (tw, th) = root.estimate_text_size(&text, &style)?;
            let pad = 10;
            let x0 = xr.start + (xr.end - xr.start) / 50;
            let y0 = yr.start + (yr.end - yr.start) / 50;
            let corner = (x0 + tw as i32 + 2 * pad, y0 + th as i32 + 2 * pad);
            root.draw(&Rectangle::new([(x0, y0), corner], ALICEBLUE.mix(0.8).filled()))?;
            root.draw(&Rectangle::new([(x0, y0), corner], BLACK.stroke_width(1)))?;
            root.draw(&Text::new(text, (x0 + pad, y0 + pad), style))?;
        }

        root.present()?;
        Ok(())
    }
}

/// Loads the store and renders the chart to `svgout`,
/// or to the scratch file in the temp directory.
/// Returns the path of the svg.
pub fn render_chart(cfg: &FeverConfig, svgout: Option<&Path>) -> Result<PathBuf> {
    if !cfg.store_path.exists() {
        return Err(FeverError::StoreNotFound(cfg.store_path.clone()));
    }
    let table = Table::read(&cfg.store_path)?;
    let mut series = FeverSeries::from_table(&table)?;
    series.sort_by_time();
    let fout = match svgout {
        Some(p) => p.to_path_buf(),
        None => std::env::temp_dir().join(SCRATCH_SVG),
    };
    series
        .plot_datetime(&fout, cfg)
        .map_err(|e| FeverError::Plot(e.to_string()))?;
    info!(points = series.len(), path = %fout.display(), "chart rendered");
    Ok(fout)
}

/// opens the svg with the default viewer of the platform
pub fn show_chart(path: &Path) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut cmd = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut cmd = {
        let mut c = std::process::Command::new("cmd");
        c.args(&["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut cmd = std::process::Command::new("xdg-open");
    cmd.arg(path).spawn()?;
    Ok(())
}

/// Chart step: renders, then shows or reports where the svg is.
/// Errors are reported and the step is skipped.
pub fn run(cfg: &FeverConfig, svgout: Option<&Path>, show: bool) {
    println!("Generating plot from '{}'...", cfg.store_path.display());
    let fout = match render_chart(cfg, svgout) {
        Ok(p) => p,
        Err(e) => {
            println!("{}", e);
            return;
        }
    };
    if svgout.is_some() {
        println!("chart saved to {}", fout.display());
    }
    if show {
        if let Err(e) = show_chart(&fout) {
            warn!(error = %e, "could not open a viewer");
            println!("could not open the chart, it is at {}", fout.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DT_FORMAT;

    fn series(points: &[(&str, f64)]) -> FeverSeries {
        let mut s = FeverSeries::new(points.len());
        for (d, t) in points {
            s.time.push(NaiveDateTime::parse_from_str(d, DT_FORMAT).unwrap());
            s.temperature.push(*t);
        }
        s
    }

    #[test]
    fn callout_reports_latest_reading() {
        let mut s = series(&[
            ("02-Jan-2026 08:15 PM", 101.0),
            ("01-Jan-2026 07:00 AM", 98.6),
        ]);
        s.sort_by_time();
        assert_eq!(
            s.callout_text().unwrap(),
            "The latest temperature on 02-Jan-2026 at 08:15 PM is: 101.0°F"
        );
        assert!(FeverSeries::new(0).callout_text().is_none());
    }

    #[test]
    fn y_range_is_fixed_for_in_range_readings() {
        let cfg = FeverConfig::default();
        let s = series(&[("01-Jan-2026 07:00 AM", 98.6), ("01-Jan-2026 08:00 AM", f64::NAN)]);
        assert_eq!(s.y_range(&cfg), (97.0, 106.0));
    }

    #[test]
    fn y_range_extends_for_out_of_range_readings() {
        let cfg = FeverConfig::default();
        let s = series(&[("01-Jan-2026 07:00 AM", 96.0), ("01-Jan-2026 08:00 AM", 107.0)]);
        assert_eq!(s.y_range(&cfg), (95.5, 107.5));
    }

    #[test]
    fn clip_policy_keeps_axis_and_drops_points() {
        let cfg = FeverConfig {
            axis_policy: AxisPolicy::Clip,
            ..FeverConfig::default()
        };
        let s = series(&[("01-Jan-2026 07:00 AM", 98.0), ("01-Jan-2026 08:00 AM", 107.0)]);
        assert_eq!(s.y_range(&cfg), (97.0, 106.0));
        let c = s.clipped(&cfg);
        assert_eq!(c.temperature[0], 98.0);
        assert!(c.temperature[1].is_nan());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn render_chart_without_store() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = FeverConfig::default().with_store_path(dir.path().join("missing.xlsx"));
        assert!(matches!(
            render_chart(&cfg, None),
            Err(FeverError::StoreNotFound(_))
        ));
    }
}
