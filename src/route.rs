//! Route exposure scoring
//!
//! Segments stay in path order. Route statistics are derived from the
//! segment list and never stored independently of it.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aqi::aqi_from_pm25;
use crate::classify::AirQualityStatus;
use crate::error::{Availability, Result, ScoreError, UnavailableReason};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// WGS84 point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// # Errors
    ///
    /// * `ScoreError::InvalidCoordinate` - latitude/longitude not finite or out of range
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if !lat.is_finite() || lat.abs() > 90.0 || !lng.is_finite() || lng.abs() > 180.0 {
            return Err(ScoreError::InvalidCoordinate(format!("({lat}, {lng})")));
        }
        Ok(Self { lat, lng })
    }

    /// Midpoint on the lat/lng plane; fine for segments a few hundred metres long
    #[must_use]
    pub fn midpoint(&self, other: &GeoPoint) -> GeoPoint {
        GeoPoint {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }
}

/// Great-circle distance in metres
#[must_use]
pub fn haversine_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Recommended running pace for a segment
///
/// Bands follow [`AirQualityStatus`] so the map and the coach agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pace {
    Unrestricted,
    Reduced,
    Walk,
}

impl Pace {
    #[must_use]
    pub fn for_aqi(aqi: f64) -> Self {
        match AirQualityStatus::from_score(aqi) {
            AirQualityStatus::Good => Self::Unrestricted,
            AirQualityStatus::Caution => Self::Reduced,
            AirQualityStatus::Avoid => Self::Walk,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unrestricted => "Any pace",
            Self::Reduced => "Easy pace",
            Self::Walk => "Walk",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Unrestricted => "Air is clean enough for hard efforts",
            Self::Reduced => "Keep the effort conversational on this stretch",
            Self::Walk => "Slow to a walk and breathe through the nose",
        }
    }
}

impl fmt::Display for Pace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSegment {
    pub start_point: GeoPoint,
    pub end_point: GeoPoint,
    pub distance_meters: f64,
    pub aqi: f64,
    /// `None` when only AQI was available for the segment
    pub pm25: Option<f64>,
    pub recommended_pace: Pace,
}

fn check_reading(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        debug!(field, value, "rejecting segment reading");
        Err(ScoreError::invalid_field(field, value))
    }
}

impl RouteSegment {
    /// Segment with an explicit distance; pace follows from `aqi`
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - distance, aqi or a present pm25 negative or not finite
    pub fn new(
        start_point: GeoPoint,
        end_point: GeoPoint,
        distance_meters: f64,
        aqi: f64,
        pm25: Option<f64>,
    ) -> Result<Self> {
        Ok(Self {
            start_point,
            end_point,
            distance_meters: check_reading("distance", distance_meters)?,
            aqi: check_reading("aqi", aqi)?,
            pm25: pm25.map(|v| check_reading("pm25", v)).transpose()?,
            recommended_pace: Pace::for_aqi(aqi),
        })
    }

    /// Segment whose distance is measured along the great circle
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - aqi or a present pm25 negative or not finite
    pub fn between(
        start_point: GeoPoint,
        end_point: GeoPoint,
        aqi: f64,
        pm25: Option<f64>,
    ) -> Result<Self> {
        let distance = haversine_meters(&start_point, &end_point);
        Self::new(start_point, end_point, distance, aqi, pm25)
    }

    fn validate(&self) -> Result<()> {
        check_reading("distance", self.distance_meters)?;
        check_reading("aqi", self.aqi)?;
        if let Some(pm25) = self.pm25 {
            check_reading("pm25", pm25)?;
        }
        Ok(())
    }
}

/// Aggregate exposure over a route
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteExposure {
    pub avg_aqi: f64,
    pub max_aqi: f64,
    /// Distance-weighted mean AQI; plain mean when every segment has zero length
    pub exposure_score: f64,
    pub distance_meters: f64,
}

/// Exposure statistics for an ordered list of segments
///
/// # Errors
///
/// * `ScoreError::InvalidReading` - a segment carries a negative or non-finite value
pub fn score(segments: &[RouteSegment]) -> Result<Availability<RouteExposure>> {
    if segments.is_empty() {
        return Ok(Availability::Unavailable(UnavailableReason::NoSegments));
    }
    for segment in segments {
        segment.validate()?;
    }

    let count = segments.len() as f64;
    let avg_aqi = segments.iter().map(|s| s.aqi).sum::<f64>() / count;
    let max_aqi = segments.iter().map(|s| s.aqi).fold(0.0, f64::max);
    let distance_meters: f64 = segments.iter().map(|s| s.distance_meters).sum();

    let exposure_score = if distance_meters > 0.0 {
        segments
            .iter()
            .map(|s| s.aqi * s.distance_meters)
            .sum::<f64>()
            / distance_meters
    } else {
        avg_aqi
    };

    Ok(Availability::Available(RouteExposure {
        avg_aqi,
        max_aqi,
        exposure_score,
        distance_meters,
    }))
}

/// Pollution values at a point, backed by the interpolation grid
pub trait PollutionField {
    fn aqi_at(&self, point: &GeoPoint) -> Option<f64>;
    fn pm25_at(&self, point: &GeoPoint) -> Option<f64>;
}

/// Scored route with its segments in path order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    segments: Vec<RouteSegment>,
    exposure: RouteExposure,
}

impl Route {
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - a segment carries a negative or non-finite value
    pub fn from_segments(segments: Vec<RouteSegment>) -> Result<Availability<Self>> {
        Ok(score(&segments)?.map(|exposure| Self { segments, exposure }))
    }

    /// Build segments between consecutive waypoints, sampling each segment's midpoint
    ///
    /// A midpoint with PM2.5 but no AQI gets its AQI from PM2.5. A midpoint
    /// with neither makes the route unavailable.
    ///
    /// # Errors
    ///
    /// * `ScoreError::InvalidReading` - sampled value negative or not finite
    /// * `ScoreError::InvalidConcentration` - sampled PM2.5 rejected by the AQI conversion
    pub fn from_waypoints<F: PollutionField + ?Sized>(
        waypoints: &[GeoPoint],
        field: &F,
    ) -> Result<Availability<Self>> {
        let mut segments = Vec::with_capacity(waypoints.len().saturating_sub(1));
        for (index, pair) in waypoints.windows(2).enumerate() {
            let (start, end) = (pair[0], pair[1]);
            let sample = start.midpoint(&end);
            let pm25 = field.pm25_at(&sample);
            let aqi = match (field.aqi_at(&sample), pm25) {
                (Some(aqi), _) => aqi,
                (None, Some(pm25)) => aqi_from_pm25(pm25)?,
                (None, None) => {
                    debug!(index, "segment midpoint has no pollution sample");
                    return Ok(Availability::Unavailable(
                        UnavailableReason::UnsampledSegment(index),
                    ));
                }
            };
            segments.push(RouteSegment::between(start, end, aqi, pm25)?);
        }
        Self::from_segments(segments)
    }

    #[must_use]
    pub fn segments(&self) -> &[RouteSegment] {
        &self.segments
    }

    #[must_use]
    pub fn exposure(&self) -> RouteExposure {
        self.exposure
    }

    #[must_use]
    pub fn avg_aqi(&self) -> f64 {
        self.exposure.avg_aqi
    }

    #[must_use]
    pub fn max_aqi(&self) -> f64 {
        self.exposure.max_aqi
    }

    #[must_use]
    pub fn exposure_score(&self) -> f64 {
        self.exposure.exposure_score
    }

    #[must_use]
    pub fn distance_meters(&self) -> f64 {
        self.exposure.distance_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const EPS: f64 = 1e-9;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn segment(distance: f64, aqi: f64) -> RouteSegment {
        RouteSegment::new(point(37.77, -122.42), point(37.78, -122.42), distance, aqi, None)
            .unwrap()
    }

    #[rstest]
    #[case(0.0, Pace::Unrestricted)]
    #[case(50.0, Pace::Unrestricted)]
    #[case(50.0001, Pace::Reduced)]
    #[case(75.0, Pace::Reduced)]
    #[case(75.0001, Pace::Walk)]
    #[case(180.0, Pace::Walk)]
    fn pace_bands_match_status(#[case] aqi: f64, #[case] expected: Pace) {
        assert_eq!(Pace::for_aqi(aqi), expected);
    }

    #[test]
    fn empty_route_is_no_data() {
        assert_eq!(
            score(&[]).unwrap(),
            Availability::Unavailable(UnavailableReason::NoSegments)
        );
        assert_eq!(
            Route::from_segments(Vec::new()).unwrap(),
            Availability::Unavailable(UnavailableReason::NoSegments)
        );
    }

    #[test]
    fn statistics_for_uneven_segments() {
        let exposure = score(&[segment(100.0, 40.0), segment(300.0, 80.0)])
            .unwrap()
            .available()
            .unwrap();
        assert!((exposure.avg_aqi - 60.0).abs() < EPS);
        assert!((exposure.max_aqi - 80.0).abs() < EPS);
        // (40 * 100 + 80 * 300) / 400
        assert!((exposure.exposure_score - 70.0).abs() < EPS);
        assert!((exposure.distance_meters - 400.0).abs() < EPS);
    }

    #[test]
    fn mean_and_max_ignore_order_but_weighting_does_not() {
        let original = [segment(100.0, 40.0), segment(300.0, 80.0), segment(50.0, 20.0)];
        let reordered = [segment(50.0, 20.0), segment(100.0, 40.0), segment(300.0, 80.0)];
        let swapped = [segment(300.0, 40.0), segment(100.0, 80.0), segment(50.0, 20.0)];

        let a = score(&original).unwrap().available().unwrap();
        let b = score(&reordered).unwrap().available().unwrap();
        let c = score(&swapped).unwrap().available().unwrap();

        assert!((a.avg_aqi - b.avg_aqi).abs() < EPS);
        assert!((a.max_aqi - b.max_aqi).abs() < EPS);
        assert!((a.exposure_score - b.exposure_score).abs() < EPS);

        assert!((a.avg_aqi - c.avg_aqi).abs() < EPS);
        assert!((a.max_aqi - c.max_aqi).abs() < EPS);
        assert!((a.exposure_score - c.exposure_score).abs() > 1.0);
    }

    #[test]
    fn zero_length_route_falls_back_to_mean() {
        let exposure = score(&[segment(0.0, 30.0), segment(0.0, 90.0)])
            .unwrap()
            .available()
            .unwrap();
        assert!((exposure.exposure_score - 60.0).abs() < EPS);
    }

    #[rstest]
    #[case(-1.0, 10.0, Some(1.0))]
    #[case(10.0, f64::NAN, Some(1.0))]
    #[case(10.0, 10.0, Some(-0.5))]
    #[case(10.0, 10.0, Some(f64::INFINITY))]
    #[case(-1.0, 10.0, None)]
    fn invalid_segment_values_are_rejected(
        #[case] distance: f64,
        #[case] aqi: f64,
        #[case] pm25: Option<f64>,
    ) {
        let result = RouteSegment::new(point(0.0, 0.0), point(0.0, 0.001), distance, aqi, pm25);
        assert!(matches!(result, Err(ScoreError::InvalidReading(_))));
    }

    #[test]
    fn tampered_segments_are_rejected_by_score() {
        let mut bad = segment(10.0, 10.0);
        bad.aqi = -3.0;
        assert!(score(&[bad]).is_err());

        let mut bad_pm25 = segment(10.0, 10.0);
        bad_pm25.pm25 = Some(f64::NAN);
        assert!(score(&[bad_pm25]).is_err());
    }

    #[test]
    fn haversine_known_distance() {
        // one degree of latitude
        let d = haversine_meters(&point(0.0, 0.0), &point(1.0, 0.0));
        assert!((d - 111_194.926_644_558_7).abs() < 1e-3, "got {d}");
        assert_eq!(haversine_meters(&point(10.0, 10.0), &point(10.0, 10.0)), 0.0);
    }

    #[test]
    fn geo_point_validation() {
        assert!(GeoPoint::new(91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        let mid = point(10.0, 20.0).midpoint(&point(20.0, 40.0));
        assert_eq!(mid, point(15.0, 30.0));
    }

    struct Gradient;

    impl PollutionField for Gradient {
        fn aqi_at(&self, point: &GeoPoint) -> Option<f64> {
            (point.lng < 0.002).then_some(point.lng * 10_000.0 + 30.0)
        }

        fn pm25_at(&self, point: &GeoPoint) -> Option<f64> {
            (point.lat < 1.0).then_some(24.0)
        }
    }

    #[test]
    fn route_from_waypoints_keeps_path_order() {
        let waypoints = [point(0.0, 0.0), point(0.0, 0.001), point(0.0, 0.002), point(0.0, 0.004)];
        let route = Route::from_waypoints(&waypoints, &Gradient)
            .unwrap()
            .available()
            .unwrap();

        let aqis: Vec<f64> = route.segments().iter().map(|s| s.aqi).collect();
        // third midpoint has no AQI and falls back to PM2.5 24.0 -> AQI ~76
        assert!((aqis[0] - 35.0).abs() < EPS);
        assert!((aqis[1] - 45.0).abs() < EPS);
        assert!((aqis[2] - 76.025_751_072_961_38).abs() < 1e-6);

        let paces: Vec<Pace> = route.segments().iter().map(|s| s.recommended_pace).collect();
        assert_eq!(paces, vec![Pace::Unrestricted, Pace::Unrestricted, Pace::Walk]);

        assert!((route.max_aqi() - aqis[2]).abs() < EPS);
        assert!(route.distance_meters() > 400.0 && route.distance_meters() < 500.0);
        // (35 + 45 + 2 * 76) / 4, the last segment being twice as long
        assert!((route.exposure_score() - 58.012_875_536_480_685).abs() < 1e-6);
        assert!(route.exposure_score() < route.max_aqi());
        assert_eq!(route.exposure(), score(route.segments()).unwrap().available().unwrap());
    }

    struct AqiOnly;

    impl PollutionField for AqiOnly {
        fn aqi_at(&self, point: &GeoPoint) -> Option<f64> {
            Some(point.lng * 10_000.0)
        }

        fn pm25_at(&self, _: &GeoPoint) -> Option<f64> {
            None
        }
    }

    #[test]
    fn segments_are_sampled_at_their_midpoint() {
        let waypoints = [point(0.0, 0.0), point(0.0, 0.01)];
        let route = Route::from_waypoints(&waypoints, &AqiOnly)
            .unwrap()
            .available()
            .unwrap();
        let segment = &route.segments()[0];
        assert!((segment.aqi - 50.0).abs() < EPS, "got {}", segment.aqi);
        assert_eq!(segment.recommended_pace, Pace::Unrestricted);
    }

    #[test]
    fn aqi_only_samples_leave_pm25_unmeasured() {
        let waypoints = [point(0.0, 0.0), point(0.0, 0.01), point(0.0, 0.02)];
        let route = Route::from_waypoints(&waypoints, &AqiOnly)
            .unwrap()
            .available()
            .unwrap();
        assert!(route.segments().iter().all(|s| s.pm25.is_none()));

        let with_pm25 = Route::from_waypoints(&waypoints[..2], &Gradient)
            .unwrap()
            .available()
            .unwrap();
        assert_eq!(with_pm25.segments()[0].pm25, Some(24.0));
    }

    struct Blank;

    impl PollutionField for Blank {
        fn aqi_at(&self, _: &GeoPoint) -> Option<f64> {
            None
        }

        fn pm25_at(&self, _: &GeoPoint) -> Option<f64> {
            None
        }
    }

    #[test]
    fn unsampled_segment_makes_route_unavailable() {
        let waypoints = [point(0.0, 0.0), point(0.0, 0.001)];
        assert_eq!(
            Route::from_waypoints(&waypoints, &Blank).unwrap(),
            Availability::Unavailable(UnavailableReason::UnsampledSegment(0))
        );
        assert_eq!(
            Route::from_waypoints(&waypoints[..1], &Blank).unwrap(),
            Availability::Unavailable(UnavailableReason::NoSegments)
        );
    }
}
