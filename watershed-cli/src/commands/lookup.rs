use anyhow::{Context, Result};
use watershed::geojson::to_feature;
use watershed::{Watershed, WatershedStore};

pub async fn run(store: &dyn WatershedStore, code: &str, json: bool) -> Result<()> {
    let watershed = store
        .find_by_any_huc(code)
        .await
        .context("Failed to query watershed")?
        .with_context(|| format!("No watershed found with HUC code: {}", code))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&to_feature(&watershed))?);
    } else {
        print!("{}", summary(&watershed));
    }

    Ok(())
}

fn summary(ws: &Watershed) -> String {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
    let number = |v: Option<i32>| v.map(|n| n.to_string()).unwrap_or_else(|| "N/A".to_string());

    let rows = [
        ("HUC-12", text(&ws.huc_12)),
        ("HUC-10", text(&ws.huc_10)),
        ("HUC-8", text(&ws.huc_8)),
        ("Name", ws.display_name().to_string()),
        ("HUC-10 name", text(&ws.hu_10_name)),
        ("Basin", text(&ws.dwq_basin)),
        (
            "Acres",
            ws.acres
                .as_ref()
                .map(|a| a.with_scale(2).to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        ("Population", number(ws.population)),
        ("Population 2010", number(ws.pop_2010)),
        (
            "Geometry",
            ws.geom
                .as_ref()
                .map(|g| geometry_type(&g.value).to_string())
                .unwrap_or_else(|| "none".to_string()),
        ),
    ];

    rows.iter()
        .map(|(label, value)| format!("{:<16} {}\n", label, value))
        .collect()
}

fn geometry_type(value: &geojson::Value) -> &'static str {
    use geojson::Value;

    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}
