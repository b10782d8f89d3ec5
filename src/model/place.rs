use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered location that check-ins can be geofenced against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "name": "Main campus",
        "address": "12 School Road",
        "latitude": 31.2304,
        "longitude": 121.4737,
        "radius": 100
    })
)]
pub struct Place {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Allowed distance from the centre, in meters.
    pub radius: u32,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewPlace {
    #[schema(example = "Main campus")]
    pub name: String,
    #[schema(example = "12 School Road")]
    pub address: String,
    #[schema(example = 31.2304)]
    pub latitude: f64,
    #[schema(example = 121.4737)]
    pub longitude: f64,
    #[schema(example = 100)]
    #[serde(default = "default_radius")]
    pub radius: u32,
}

fn default_radius() -> u32 {
    100
}

impl NewPlace {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".into());
        }
        check_coordinates(self.latitude, self.longitude)
    }
}

// NaN fails both range checks
fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err("latitude must be within [-90, 90]".into());
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err("longitude must be within [-180, 180]".into());
    }
    Ok(())
}

/// A claimed position reported by the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn validate(&self) -> Result<(), String> {
        check_coordinates(self.latitude, self.longitude)
    }
}
