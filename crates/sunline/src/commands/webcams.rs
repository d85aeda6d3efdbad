//! Webcam listing and preview resolution.

use serde::Serialize;
use tabled::Tabled;

use sunline_core::{
    ChCoord, Compass8, PreviewStrategy, Webcam, compass8_from_bearing, planar_bearing_deg,
    planar_distance_km, resolve_preview_base_url,
};

use crate::cli::{GlobalOpts, PreviewArgs, WebcamSort, WebcamsArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Views ───────────────────────────────────────────────────────────

/// A webcam as seen from the configured user coordinate.
#[derive(Debug, Serialize)]
struct WebcamView {
    id: String,
    name: String,
    elevation_m_asl: u32,
    distance_km: f64,
    bearing_deg: f64,
    compass: Compass8,
    strategy: PreviewStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    attribution: Option<String>,
}

impl WebcamView {
    fn new(webcam: &Webcam, from: ChCoord) -> Self {
        let bearing = planar_bearing_deg(from, webcam.coord_ch2056);
        Self {
            id: webcam.id.clone(),
            name: webcam.name.clone(),
            elevation_m_asl: webcam.elevation_m_asl,
            distance_km: round1(planar_distance_km(from, webcam.coord_ch2056)),
            bearing_deg: round1(bearing),
            compass: compass8_from_bearing(bearing),
            strategy: PreviewStrategy::classify(webcam),
            attribution: webcam.attribution.clone(),
        }
    }
}

#[derive(Tabled)]
struct WebcamRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Elev (m)")]
    elevation: u32,
    #[tabled(rename = "Dist (km)")]
    distance: String,
    #[tabled(rename = "Bearing")]
    bearing: String,
    #[tabled(rename = "Preview")]
    strategy: String,
}

impl From<&WebcamView> for WebcamRow {
    fn from(v: &WebcamView) -> Self {
        Self {
            id: v.id.clone(),
            name: v.name.clone(),
            elevation: v.elevation_m_asl,
            distance: format!("{:.1}", v.distance_km),
            bearing: format!("{:>5.1}° {}", v.bearing_deg, v.compass),
            strategy: v.strategy.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PreviewView {
    id: String,
    strategy: PreviewStrategy,
    url: String,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ── Handlers ────────────────────────────────────────────────────────

pub fn list(args: &WebcamsArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::load_catalogue(&util::catalogue_path(global))?;
    let from = config.settings.user_coord_ch2056;

    let mut views: Vec<WebcamView> = config
        .webcams
        .iter()
        .map(|w| WebcamView::new(w, from))
        .collect();
    match args.sort {
        WebcamSort::Distance => views.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km)),
        WebcamSort::Name => views.sort_by(|a, b| a.name.cmp(&b.name)),
        WebcamSort::Elevation => views.sort_by(|a, b| b.elevation_m_asl.cmp(&a.elevation_m_asl)),
        WebcamSort::Catalogue => {}
    }

    let out = output::render_list(
        global.output,
        &views,
        |v| WebcamRow::from(v),
        |v| v.id.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn preview(args: &PreviewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = util::load_catalogue(&util::catalogue_path(global))?;
    let webcam = util::find_webcam(&config, &args.id)?;
    let base = util::worker_base_url(global, &config)?;

    let url = resolve_preview_base_url(webcam, &base).ok_or_else(|| CliError::NoPreview {
        id: webcam.id.clone(),
        kind: webcam.source.kind().to_string(),
    })?;
    let view = PreviewView {
        id: webcam.id.clone(),
        strategy: PreviewStrategy::classify(webcam),
        url,
    };

    let out = output::render_single(
        global.output,
        &view,
        |v| {
            output::detail_lines(&[
                ("ID", v.id.clone()),
                ("Strategy", v.strategy.to_string()),
                ("URL", v.url.clone()),
            ])
        },
        |v| v.url.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sunline_core::{SourceUrl, WebcamSource};

    #[test]
    fn view_computes_geometry_from_user_coordinate() {
        let webcam = Webcam {
            id: "east".into(),
            name: "East Cam".into(),
            elevation_m_asl: 900,
            coord_ch2056: ChCoord::new(2_603_000.0, 1_200_000.0),
            source: WebcamSource::Snapshot {
                url: SourceUrl::parse("https://cams.example.org/east.jpg").unwrap(),
            },
            worker_bypass: None,
            attribution: None,
        };
        let view = WebcamView::new(&webcam, ChCoord::new(2_600_000.0, 1_200_000.0));
        assert!((view.distance_km - 3.0).abs() < f64::EPSILON);
        assert!((view.bearing_deg - 90.0).abs() < f64::EPSILON);
        assert_eq!(view.compass, Compass8::E);
        assert_eq!(view.strategy, PreviewStrategy::ProxiedSnapshot);
    }
}
