use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Active filter combination narrowing a region's product query.
///
/// An empty string means the field is unset and the corresponding query
/// parameter is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    pub subsector: String,
    pub product: String,
    pub year: String,
}

impl FilterSelection {
    /// Merge the given fields into the selection. `Some("")` unsets a field.
    pub fn apply(&mut self, patch: FilterPatch) {
        if let Some(subsector) = patch.subsector {
            self.subsector = subsector;
        }
        if let Some(product) = patch.product {
            self.product = product;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.subsector.is_empty() && self.product.is_empty() && self.year.is_empty()
    }
}

/// Partial update for [`FilterSelection`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub subsector: Option<String>,
    pub product: Option<String>,
    pub year: Option<String>,
}

/// A fixed map marker for one of the nine regions with data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMarker {
    pub id: u32,
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub color: &'static str,
}

/// The nine administrative regions that actually carry price records.
/// Ids follow the official region numbering, which is why they are sparse.
pub const REGION_MARKERS: &[RegionMarker] = &[
    RegionMarker { id: 4, name: "Región de Coquimbo", lat: -30.600, lng: -71.200, color: "#4ECDC4" },
    RegionMarker { id: 5, name: "Región de Valparaíso", lat: -33.046, lng: -71.620, color: "#45B7D1" },
    RegionMarker { id: 7, name: "Región del Maule", lat: -35.426, lng: -71.668, color: "#96CEB4" },
    RegionMarker { id: 8, name: "Región del Biobío", lat: -36.827, lng: -73.050, color: "#FFEAA7" },
    RegionMarker { id: 9, name: "Región de La Araucanía", lat: -38.736, lng: -72.591, color: "#DDA0DD" },
    RegionMarker { id: 10, name: "Región de Los Lagos", lat: -41.469, lng: -72.942, color: "#98D8C8" },
    RegionMarker { id: 13, name: "Región Metropolitana de Santiago", lat: -33.449, lng: -70.669, color: "#F7DC6F" },
    RegionMarker { id: 15, name: "Región de Arica y Parinacota", lat: -18.478, lng: -70.312, color: "#BB8FCE" },
    RegionMarker { id: 16, name: "Región de Ñuble", lat: -36.624, lng: -71.957, color: "#85C1E9" },
];

/// Look up a marker by region id.
pub fn find_region(id: u32) -> Option<&'static RegionMarker> {
    REGION_MARKERS.iter().find(|marker| marker.id == id)
}

/// Global counts from `/api/resumen/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GlobalSummary {
    #[serde(default)]
    pub total_registros: i64,
    #[serde(default)]
    pub total_regiones: i64,
    #[serde(default)]
    pub total_productos: i64,
    #[serde(default)]
    pub total_mercados: i64,
    #[serde(default)]
    pub fecha_reciente: Option<NaiveDate>,
}

/// Available filter values from `/api/filtros/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FilterOptions {
    #[serde(rename = "años", default)]
    pub years: Vec<i32>,
    #[serde(default)]
    pub subsectores: Vec<NamedEntry>,
    #[serde(default)]
    pub productos: Vec<NamedEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NamedEntry {
    pub nombre: String,
}

/// Region detail from `/api/region/{id}/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionDetail {
    pub region_id: u32,
    pub region_nombre: String,
    #[serde(default)]
    pub total_registros: i64,
    #[serde(default)]
    pub total_productos: i64,
    #[serde(default)]
    pub total_mercados: i64,
    #[serde(default)]
    pub subsectores: Vec<SubsectorCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubsectorCount {
    pub nombre: String,
    #[serde(default)]
    pub total: i64,
}

/// Filtered product list from `/api/region/{id}/productos/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegionProductList {
    #[serde(default)]
    pub total_resultados: i64,
    #[serde(default)]
    pub filtros_aplicados: Option<Value>,
    #[serde(default)]
    pub productos: Vec<ProductRow>,
}

/// One aggregated product row for a region.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRow {
    #[serde(rename = "producto__nombre", default)]
    pub producto: Option<String>,
    #[serde(rename = "subsector__nombre", default)]
    pub subsector: Option<String>,
    #[serde(default, deserialize_with = "de_decimal")]
    pub precio_promedio: Option<f64>,
    #[serde(default, deserialize_with = "de_decimal")]
    pub volumen_total: Option<f64>,
    #[serde(default)]
    pub total_registros: i64,
}

/// Batched comparison from `/api/comparar-regiones/`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComparisonResponse {
    #[serde(default)]
    pub total_regiones: i64,
    #[serde(default)]
    pub regiones_comparadas: Vec<ComparisonRow>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ComparisonRow {
    pub region_nombre: String,
    #[serde(default)]
    pub estadisticas: ComparisonStats,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ComparisonStats {
    #[serde(default)]
    pub total_registros: i64,
    #[serde(default)]
    pub productos_unicos: i64,
    #[serde(default)]
    pub total_mercados: i64,
    #[serde(default, deserialize_with = "de_decimal")]
    pub precio_promedio: Option<f64>,
    #[serde(default, deserialize_with = "de_decimal")]
    pub volumen_total: Option<f64>,
}

/// The backend serializes decimal aggregates inconsistently: as JSON numbers,
/// as quoted strings, or as null. Accept all three.
fn de_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Ok(Config {
            api_base_url: std::env::var("AGRO_API_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string()),
            http_timeout_secs: std::env::var("AGRO_HTTP_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
        })
    }
}
