//! Route Exposure Example for Exposure Engine
//!
//! This example samples a synthetic pollution field along two candidate
//! routes, compares their exposure and pre-filters the overlay tiles needed
//! to draw them.
//!
//! Run with: cargo run --example route_exposure

use exposure_engine::route::{GeoPoint, PollutionField};
use exposure_engine::tile::{TileDecision, lat_lng_to_tile};
use exposure_engine::{Availability, Route, TileBounds, TileFilter};
use tracing_subscriber::EnvFilter;

/// Pollution that rises toward a freeway at a fixed longitude
struct FreewayField {
    freeway_lng: f64,
    background_pm25: f64,
}

impl PollutionField for FreewayField {
    fn aqi_at(&self, _point: &GeoPoint) -> Option<f64> {
        // Only PM2.5 is sampled; the engine derives AQI from it
        None
    }

    fn pm25_at(&self, point: &GeoPoint) -> Option<f64> {
        let distance_deg = (point.lng - self.freeway_lng).abs();
        Some(self.background_pm25 + 40.0 / (1.0 + distance_deg * 200.0))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("🗺️  Exposure Engine - Route Exposure Example\n");

    let field = FreewayField {
        freeway_lng: -122.405,
        background_pm25: 6.0,
    };

    let along_freeway = [
        GeoPoint::new(37.760, -122.406)?,
        GeoPoint::new(37.770, -122.405)?,
        GeoPoint::new(37.780, -122.404)?,
        GeoPoint::new(37.790, -122.405)?,
    ];
    let through_park = [
        GeoPoint::new(37.760, -122.406)?,
        GeoPoint::new(37.768, -122.425)?,
        GeoPoint::new(37.782, -122.428)?,
        GeoPoint::new(37.790, -122.405)?,
    ];

    // Example 1: Compare two routes
    println!("🚶 Example 1: Route Comparison");
    println!("==============================");
    let mut best: Option<(&str, f64)> = None;
    for (name, waypoints) in [("Along the freeway", &along_freeway[..]), ("Through the park", &through_park[..])] {
        match Route::from_waypoints(waypoints, &field)? {
            Availability::Available(route) => {
                print_route(name, &route);
                if best.is_none_or(|(_, score)| route.exposure_score() < score) {
                    best = Some((name, route.exposure_score()));
                }
            }
            Availability::Unavailable(reason) => println!("  {name}: ❓ {reason:?}"),
        }
    }
    if let Some((name, score)) = best {
        println!("  ✅ Cleanest option: {name} (exposure {score:.1})");
    }
    println!();

    // Example 2: Overlay tiles for the area
    println!("🧩 Example 2: Overlay Tile Pre-filter");
    println!("=====================================");
    let region = TileBounds::new(37.80, 37.75, -122.39, -122.44)?;
    let filter = TileFilter::new(region);
    let zoom = 14;
    let tiles = filter.tiles_in_region(zoom)?;
    println!("  {} tiles at zoom {zoom} cover the region", tiles.len());

    let start = lat_lng_to_tile(along_freeway[0].lat, along_freeway[0].lng, zoom)?;
    let far_away = lat_lng_to_tile(40.7128, -74.0060, zoom)?;
    for tile in [start, far_away] {
        match filter.decide(tile.x, tile.y, tile.zoom)? {
            TileDecision::Fetch(bounds) => println!(
                "  📥 {}/{}/{} fetch (N {:.4}, S {:.4}, E {:.4}, W {:.4})",
                tile.zoom, tile.x, tile.y, bounds.north, bounds.south, bounds.east, bounds.west
            ),
            TileDecision::Skip => {
                println!("  ⏭️  {}/{}/{} skipped, transparent tile", tile.zoom, tile.x, tile.y);
            }
        }
    }

    Ok(())
}

fn print_route(name: &str, route: &Route) {
    println!(
        "  {name}: {:.0} m, avg AQI {:.1}, max AQI {:.1}, exposure {:.1}",
        route.distance_meters(),
        route.avg_aqi(),
        route.max_aqi(),
        route.exposure_score()
    );
    for (index, segment) in route.segments().iter().enumerate() {
        let pm25 = segment
            .pm25
            .map_or_else(|| "n/a".to_string(), |v| format!("{v:.1}"));
        println!(
            "    #{index} {:>6.0} m  AQI {:>5.1}  PM2.5 {pm25:>5}  pace: {}",
            segment.distance_meters, segment.aqi, segment.recommended_pace
        );
    }
}
