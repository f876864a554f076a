//! Built-in sample backend so the dashboard runs without the analytics API.

use serde_json::{json, Value};

use crate::api::{
    CategoryField, CategoryRecord, Coordinates, InMemoryDashboardApi, OpportunityCharts,
    PortfolioVisualizations, PropertyDetail, PropertyOption, PropertySummary,
};
use crate::listing::Listing;

struct DemoProperty {
    stock: &'static str,
    city: &'static str,
    price: Option<u64>,
    acres: f64,
    demand: f64,
    housing_gap: f64,
    affordability: i64,
    convenience: f64,
    score: f64,
    coordinates: Option<(f64, f64)>,
}

const DEMO_PROPERTIES: [DemoProperty; 6] = [
    DemoProperty {
        stock: "AZ-1001",
        city: "Tucson",
        price: Some(185_000),
        acres: 4.6,
        demand: 1_245.0,
        housing_gap: 0.0412,
        affordability: -18_400,
        convenience: 0.71,
        score: 0.86,
        coordinates: Some((32.2226, -110.9747)),
    },
    DemoProperty {
        stock: "AZ-1002",
        city: "Casa Grande",
        price: Some(92_500),
        acres: 2.1,
        demand: 640.0,
        housing_gap: 0.0188,
        affordability: 6_250,
        convenience: 0.52,
        score: 0.58,
        coordinates: Some((32.8795, -111.7574)),
    },
    DemoProperty {
        stock: "AZ-1003",
        city: "Kingman",
        price: None,
        acres: 38.0,
        demand: 310.0,
        housing_gap: 0.0097,
        affordability: 12_900,
        convenience: 0.33,
        score: 0.31,
        coordinates: None,
    },
    DemoProperty {
        stock: "AZ-1004",
        city: "Prescott Valley",
        price: Some(410_000),
        acres: 9.75,
        demand: 2_015.0,
        housing_gap: 0.0521,
        affordability: -3_100,
        convenience: 0.79,
        score: 0.93,
        coordinates: Some((34.6100, -112.3157)),
    },
    DemoProperty {
        stock: "AZ-1005",
        city: "Sierra Vista",
        price: Some(64_000),
        acres: 1.2,
        demand: 505.0,
        housing_gap: 0.0144,
        affordability: 2_480,
        convenience: 0.47,
        score: 0.44,
        coordinates: Some((31.5545, -110.3037)),
    },
    DemoProperty {
        stock: "AZ-1006",
        city: "Lake Havasu City",
        price: None,
        acres: 15.3,
        demand: 720.0,
        housing_gap: 0.0233,
        affordability: -950,
        convenience: 0.58,
        score: 0.67,
        coordinates: Some((34.4839, -114.3225)),
    },
];

pub(crate) fn demo_api() -> InMemoryDashboardApi {
    let mut api = InMemoryDashboardApi::default();

    for property in &DEMO_PROPERTIES {
        api.listings.push(demo_listing(property));
        api.properties
            .insert(property.stock.to_string(), demo_detail(property));
        api.opportunity
            .insert(property.stock.to_string(), demo_opportunity(property));
        api.reports
            .insert(property.stock.to_string(), demo_report(property));
        api.radar_charts
            .insert(property.stock.to_string(), radar_figure(property));
        api.property_options.push(PropertyOption {
            id: property.stock.to_string(),
            name: format!("{} ({})", property.stock, property.city),
        });
    }

    api.visualizations = demo_visualizations();
    api
}

fn currency(amount: Option<u64>) -> Value {
    match amount {
        Some(amount) => Value::String(format!("${}", group_digits(amount))),
        None => Value::String("N/A".to_string()),
    }
}

fn group_digits(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn price_per_acre(property: &DemoProperty) -> Option<u64> {
    property
        .price
        .map(|price| (price as f64 / property.acres).round() as u64)
}

fn demo_listing(property: &DemoProperty) -> Listing {
    let value = json!({
        "StockNumber": property.stock,
        "Sale Price": currency(property.price),
        "Acres": property.acres,
        "Price/Acre": currency(price_per_acre(property)),
        "Demand": property.demand,
        "Housing Gap": property.housing_gap,
        "Affordability": format!("{}", property.affordability),
        "Convenience": property.convenience,
        "Score": format!("{:.2}", property.score),
    });
    serde_json::from_value(value).unwrap_or_default()
}

fn field(name: &str, field: &str, value: Value) -> CategoryField {
    CategoryField {
        name: name.to_string(),
        field: field.to_string(),
        value,
    }
}

fn demo_detail(property: &DemoProperty) -> PropertyDetail {
    let mut categories = vec![
        CategoryRecord {
            name: "Property Information".to_string(),
            fields: vec![
                field("StockNumber", "StockNumber", json!(property.stock)),
                field("City", "City", json!(property.city)),
                field("State", "State", json!("AZ")),
                field("Sale Price", "For Sale Price", currency(property.price)),
                field("Acres", "Land Area (AC)", json!(format!("{:.2}", property.acres))),
                field(
                    "Price per Acre",
                    "Price Per Acre",
                    currency(price_per_acre(property)),
                ),
            ],
        },
        CategoryRecord {
            name: "Location Details".to_string(),
            fields: vec![
                field(
                    "Latitude",
                    "Latitude",
                    json!(property
                        .coordinates
                        .map(|(lat, _)| format!("{lat:.4}"))
                        .unwrap_or_else(|| "N/A".to_string())),
                ),
                field(
                    "Longitude",
                    "Longitude",
                    json!(property
                        .coordinates
                        .map(|(_, lng)| format!("{lng:.4}"))
                        .unwrap_or_else(|| "N/A".to_string())),
                ),
                field("Nearest Town", "Nearest Town", json!(property.city)),
            ],
        },
    ];

    for minutes in [5u32, 10, 15, 20, 25] {
        let scale = f64::from(minutes) / 5.0;
        categories.push(CategoryRecord {
            name: format!("Demographics Data ({minutes} min)"),
            fields: vec![
                field(
                    "Total Population",
                    &format!("TotPop_{minutes}"),
                    json!(format!("{:.2}", property.demand * 3.1 * scale)),
                ),
                field(
                    "Median Household Income",
                    &format!("MedianHHInc_{minutes}"),
                    json!(format!("${}", group_digits(48_000 + u64::from(minutes) * 350))),
                ),
            ],
        });
    }

    categories.push(CategoryRecord {
        name: "Analytics Metrics".to_string(),
        fields: vec![
            field(
                "Demand for Attainable Rent",
                "Demand for Attainable Rent",
                json!(format!("{:.2}", property.demand)),
            ),
            field(
                "Housing Gap (units per person)",
                "Housing Gap",
                json!(format!("{:.4}", property.housing_gap)),
            ),
            field(
                "Home Affordability Gap",
                "Home Affordability Gap",
                json!(format!("{}", property.affordability)),
            ),
            field(
                "Composite Score",
                "Composite Score",
                json!(format!("{:.2}", property.score)),
            ),
        ],
    });

    PropertyDetail {
        summary: PropertySummary {
            stock_number: property.stock.to_string(),
            location: format!("{}, AZ", property.city),
            price: currency(property.price),
            acres: json!(format!("{:.2}", property.acres)),
            score: json!(format!("{:.2}", property.score)),
            company: None,
            phone: None,
        },
        categories,
        map: property.coordinates.map(|(latitude, longitude)| Coordinates {
            latitude,
            longitude,
        }),
    }
}

fn radar_figure(property: &DemoProperty) -> Value {
    json!({
        "data": [{
            "type": "scatterpolar",
            "fill": "toself",
            "name": property.stock,
            "r": [property.score, property.convenience, property.housing_gap * 10.0, property.demand / 2_500.0],
            "theta": ["Score", "Convenience", "Housing Gap", "Demand"],
        }],
        "layout": {"title": format!("{} opportunity profile", property.stock), "polar": {"radialaxis": {"range": [0, 1]}}},
    })
}

fn demo_opportunity(property: &DemoProperty) -> OpportunityCharts {
    OpportunityCharts {
        radar_chart: Some(radar_figure(property)),
        quadrant_chart: Some(json!({
            "data": [{"type": "scatter", "mode": "markers", "x": [property.convenience], "y": [property.score], "text": [property.stock]}],
            "layout": {"title": "Opportunity Quadrant", "xaxis": {"title": "Convenience"}, "yaxis": {"title": "Score"}},
        })),
        growth_gap_chart: Some(json!({
            "data": [{"type": "bar", "x": ["Demand", "Housing Gap"], "y": [property.demand, property.housing_gap]}],
            "layout": {"title": "Growth Gap"},
        })),
        advantage_chart: None,
    }
}

fn demo_report(property: &DemoProperty) -> String {
    format!(
        "Summary:\n{stock} in {city} scores {score:.2} on the composite index.\n\nStrengths:\n- Demand for attainable rent of {demand:.0}\n- Convenience index {convenience:.2}\n\nNext steps:\n1. Confirm zoning with the county\n2. Review utilities access",
        stock = property.stock,
        city = property.city,
        score = property.score,
        demand = property.demand,
        convenience = property.convenience,
    )
}

fn demo_visualizations() -> PortfolioVisualizations {
    let stocks: Vec<&str> = DEMO_PROPERTIES.iter().map(|p| p.stock).collect();
    let scores: Vec<f64> = DEMO_PROPERTIES.iter().map(|p| p.score).collect();
    let convenience: Vec<f64> = DEMO_PROPERTIES.iter().map(|p| p.convenience).collect();
    let gaps: Vec<f64> = DEMO_PROPERTIES.iter().map(|p| p.housing_gap).collect();

    PortfolioVisualizations {
        opportunity_quadrant: Some(json!({
            "data": [{"type": "scatter", "mode": "markers+text", "x": convenience, "y": scores, "text": stocks}],
            "layout": {"title": "Opportunity Quadrant"},
        })),
        growth_gap_chart: Some(json!({
            "data": [{"type": "bar", "x": stocks, "y": gaps}],
            "layout": {"title": "Housing Growth Gap"},
        })),
        price_to_potential_map: None,
        competitive_advantage_matrix: None,
        radar_chart: DEMO_PROPERTIES.first().map(radar_figure),
    }
}
