use serde::Serialize;

use crate::models::Building;

const MISSING: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
}

/// Detail panel for the selected building.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoPanel {
    pub title: &'static str,
    pub building_id: String,
    pub rows: Vec<InfoRow>,
}

impl InfoPanel {
    pub fn value(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row.label == label)
            .map(|row| row.value.as_str())
    }
}

fn or_missing(value: Option<String>) -> String {
    value.unwrap_or_else(|| MISSING.to_string())
}

pub fn info_panel(building: &Building) -> InfoPanel {
    let row = |label, value| InfoRow { label, value };
    InfoPanel {
        title: "Building Information",
        building_id: building.id.clone(),
        rows: vec![
            row("Address", or_missing(building.address.clone())),
            row("Height", or_missing(building.height.map(|h| format!("{:.2} m", h)))),
            row("Assessed Value", or_missing(building.assessed_value.and_then(format_currency))),
            row("Land Use", or_missing(building.land_use.clone())),
            row("Year Built", or_missing(building.year_built.map(|y| y.to_string()))),
            row("Roll Number", or_missing(building.roll_number.clone())),
            row("Structure ID", building.id.clone()),
        ],
    }
}

/// Hover text shown next to the pointer.
pub fn tooltip(building: &Building) -> String {
    let height = building
        .height
        .map(|h| format!("{:.2}m", h))
        .unwrap_or_else(|| MISSING.to_string());
    format!("Building ID: {}\nHeight: {}", building.id, height)
}

/// Whole US dollars with thousands separators, e.g. `$15,250,000`.
pub fn format_currency(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.abs().round() as u64;
    let digits = rounded.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 && rounded > 0 { "-" } else { "" };
    Some(format!("{}${}", sign, grouped))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_building() -> Building {
        let mut b = Building::new("S-17", vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        b.height = Some(152.4);
        b.assessed_value = Some(15_250_000.4);
        b.land_use = Some("CR20-C20/R20".into());
        b.year_built = Some(1979);
        b.address = Some("123 7 AV SW".into());
        b.roll_number = Some("068123450".into());
        b
    }

    #[test]
    fn panel_lists_all_attributes() {
        let panel = info_panel(&full_building());
        assert_eq!(panel.title, "Building Information");
        let labels: Vec<_> = panel.rows.iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec!["Address", "Height", "Assessed Value", "Land Use", "Year Built", "Roll Number", "Structure ID"]
        );
        assert_eq!(panel.value("Height"), Some("152.40 m"));
        assert_eq!(panel.value("Assessed Value"), Some("$15,250,000"));
        assert_eq!(panel.value("Year Built"), Some("1979"));
        assert_eq!(panel.value("Structure ID"), Some("S-17"));
    }

    #[test]
    fn missing_attributes_show_placeholder() {
        let panel = info_panel(&Building::new("bare", vec![]));
        for label in ["Address", "Height", "Assessed Value", "Land Use", "Year Built", "Roll Number"] {
            assert_eq!(panel.value(label), Some("N/A"), "{}", label);
        }
    }

    #[test]
    fn zero_height_is_shown_not_missing() {
        let b = Building::new("z", vec![]).with_height(0.0);
        assert_eq!(info_panel(&b).value("Height"), Some("0.00 m"));
    }

    #[test]
    fn panel_serializes_with_camel_case_keys() {
        let json = serde_json::to_value(info_panel(&full_building())).unwrap();
        assert_eq!(json["buildingId"], "S-17");
        assert!(json.get("building_id").is_none());
        assert_eq!(json["rows"][0]["label"], "Address");
    }

    #[test]
    fn tooltip_text() {
        assert_eq!(tooltip(&full_building()), "Building ID: S-17\nHeight: 152.40m");
        assert_eq!(tooltip(&Building::new("x", vec![])), "Building ID: x\nHeight: N/A");
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(format_currency(0.0).as_deref(), Some("$0"));
        assert_eq!(format_currency(999.5).as_deref(), Some("$1,000"));
        assert_eq!(format_currency(123_456.0).as_deref(), Some("$123,456"));
        assert_eq!(format_currency(1_000_000.0).as_deref(), Some("$1,000,000"));
        assert_eq!(format_currency(f64::NAN), None);
    }
}
