//! Random route construction.
//!
//! Routes are grown one endpoint extension at a time: pick one of the
//! endpoints that has legal moves uniformly at random, then one of its
//! candidates uniformly at random. Growth stops when no legal move is left
//! or the step budget is spent.

use rand::Rng;

use crate::error::Result;
use crate::models::{MoveOptions, RailNetwork, RouteId, StationId};

/// Extends `route` by one random legal move.
///
/// Returns the added station, or `None` if the route has no legal move
/// (which is not an error).
///
/// # Examples
///
/// ```
/// use rail_routing::models::{MoveOptions, RailNetwork};
/// use rail_routing::constructive::extend_randomly;
/// use rand::SeedableRng;
///
/// let mut b = RailNetwork::builder();
/// b.add_station("A", 0.0, 0.0).unwrap();
/// b.add_station("B", 1.0, 0.0).unwrap();
/// b.add_connection("A", "B", 10.0).unwrap();
/// let mut network = b.build();
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(42);
/// let route = network.create_route(network.station_id("A").unwrap()).unwrap();
/// let added = extend_randomly(&mut network, route, 60.0, &MoveOptions::default(), &mut rng).unwrap();
/// assert_eq!(added, Some(network.station_id("B").unwrap()));
/// ```
pub fn extend_randomly<R: Rng>(
    network: &mut RailNetwork,
    route: RouteId,
    max_duration: f64,
    options: &MoveOptions,
    rng: &mut R,
) -> Result<Option<StationId>> {
    if !network.has_legal_moves(route, max_duration, options)? {
        return Ok(None);
    }

    let moves = network.legal_moves(route, max_duration, options)?;
    let positions: Vec<usize> = moves.keys().copied().collect();
    let position = positions[rng.random_range(0..positions.len())];
    let candidates = &moves[&position];
    let station = candidates[rng.random_range(0..candidates.len())].station;

    if position == 0 {
        network.insert_station(route, 0, station)?;
    } else {
        network.append_station(route, station)?;
    }
    Ok(Some(station))
}

/// Creates a route at `root` and grows it by up to `max_steps` random
/// legal moves under `max_duration`.
pub fn random_route<R: Rng>(
    network: &mut RailNetwork,
    root: StationId,
    max_duration: f64,
    max_steps: usize,
    options: &MoveOptions,
    rng: &mut R,
) -> Result<RouteId> {
    let route = network.create_route(root)?;
    for _ in 0..max_steps {
        if extend_randomly(network, route, max_duration, options, rng)?.is_none() {
            break;
        }
    }
    Ok(route)
}

/// Creates `num_routes` random routes, each rooted at a uniformly random
/// station.
///
/// Returns no routes for a network without stations.
pub fn random_solution<R: Rng>(
    network: &mut RailNetwork,
    num_routes: usize,
    max_duration: f64,
    max_steps: usize,
    rng: &mut R,
) -> Result<Vec<RouteId>> {
    let n = network.stations().len();
    if n == 0 {
        return Ok(Vec::new());
    }

    let options = MoveOptions::default();
    let mut routes = Vec::with_capacity(num_routes);
    for _ in 0..num_routes {
        let root = network.stations()[rng.random_range(0..n)].id();
        routes.push(random_route(network, root, max_duration, max_steps, &options, rng)?);
    }
    Ok(routes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoveFilter;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Ring of six stations, 10 minutes apart.
    fn ring() -> RailNetwork {
        let mut b = RailNetwork::builder();
        for i in 0..6 {
            b.add_station(&format!("S{i}"), i as f64, 0.0).expect("station");
        }
        for i in 0..6 {
            b.add_connection(&format!("S{i}"), &format!("S{}", (i + 1) % 6), 10.0)
                .expect("connection");
        }
        b.build()
    }

    #[test]
    fn test_extend_no_moves() {
        let mut b = RailNetwork::builder();
        b.add_station("Lonely", 0.0, 0.0).expect("station");
        let mut n = b.build();
        let r = n.create_route(StationId(0)).expect("route");
        let mut rng = StdRng::seed_from_u64(1);
        let added = extend_randomly(&mut n, r, 100.0, &MoveOptions::default(), &mut rng)
            .expect("extend");
        assert_eq!(added, None);
        assert_eq!(n.route(r).expect("route").n_stations(), 1);
    }

    #[test]
    fn test_random_route_respects_cap() {
        let mut n = ring();
        let mut rng = StdRng::seed_from_u64(7);
        for root in 0..6 {
            let r = random_route(&mut n, StationId(root), 45.0, 100, &MoveOptions::default(), &mut rng)
                .expect("route");
            let route = n.route(r).expect("route");
            assert!(route.is_valid(45.0));
            // 4 links of 10 fit below 45, a fifth does not
            assert_eq!(route.length(), 4);
        }
        n.check_invariants().expect("invariants");
    }

    #[test]
    fn test_random_route_step_budget() {
        let mut n = ring();
        let mut rng = StdRng::seed_from_u64(3);
        let r = random_route(&mut n, StationId(0), 1000.0, 3, &MoveOptions::default(), &mut rng)
            .expect("route");
        assert_eq!(n.route(r).expect("route").length(), 3);
    }

    #[test]
    fn test_random_route_unused_filter_never_repeats_connection() {
        let mut n = ring();
        let mut rng = StdRng::seed_from_u64(11);
        let opts = MoveOptions::default().with_filter(MoveFilter::UnusedConnections);
        let r = random_route(&mut n, StationId(2), 1000.0, 100, &opts, &mut rng).expect("route");
        let route = n.route(r).expect("route");
        assert_eq!(route.length(), 6);
        assert_eq!(route.unique_connection_count(), 6);
        assert!((n.coverage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_random_solution() {
        let mut n = ring();
        let mut rng = StdRng::seed_from_u64(5);
        let routes = random_solution(&mut n, 4, 35.0, 50, &mut rng).expect("solution");
        assert_eq!(routes.len(), 4);
        assert_eq!(n.num_routes(), 4);
        for r in n.list_routes() {
            assert!(r.is_valid(35.0));
        }
        n.check_invariants().expect("invariants");
    }

    #[test]
    fn test_random_solution_empty_network() {
        let mut n = RailNetwork::builder().build();
        let mut rng = StdRng::seed_from_u64(5);
        assert!(random_solution(&mut n, 3, 100.0, 10, &mut rng)
            .expect("solution")
            .is_empty());
    }

    #[test]
    fn test_seeded_reproducible() {
        let build = |seed| {
            let mut n = ring();
            let mut rng = StdRng::seed_from_u64(seed);
            random_solution(&mut n, 3, 55.0, 20, &mut rng).expect("solution");
            n.route_listing()
        };
        assert_eq!(build(9), build(9));
    }
}
