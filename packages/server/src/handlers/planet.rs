use axum::Json;
use common::contract::Planet;
use tracing::instrument;

const PLANETS: [(&str, &str, f64); 8] = [
    ("Mercury", "Terrestrial", 0.39),
    ("Venus", "Terrestrial", 0.72),
    ("Earth", "Terrestrial", 1.0),
    ("Mars", "Terrestrial", 1.52),
    ("Jupiter", "Gas Giant", 5.2),
    ("Saturn", "Gas Giant", 9.58),
    ("Uranus", "Ice Giant", 19.22),
    ("Neptune", "Ice Giant", 30.05),
];

/// The planets of the solar system ordered by distance from the sun.
pub fn catalogue() -> Vec<Planet> {
    PLANETS
        .iter()
        .zip(1..)
        .map(|(&(name, kind, distance_au), id)| Planet {
            id,
            name: name.to_string(),
            kind: kind.to_string(),
            distance_au,
        })
        .collect()
}

#[utoipa::path(
    post,
    path = "/rpc/planet/list",
    tag = "Planets",
    operation_id = "planet.list",
    summary = "List the planets",
    responses((status = 200, description = "Static planet catalogue", body = Vec<Planet>)),
)]
#[instrument]
pub async fn list() -> Json<Vec<Planet>> {
    Json(catalogue())
}
