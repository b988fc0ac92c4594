mod common;

#[cfg(test)]
mod image_cache_tests {
    use super::common::Harness;
    use mapview::prelude::*;

    fn harness() -> Harness {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(16384.0, 16384.0), 1.0),
        );
        h.map
            .add_layer(Box::new(TileLayer::new(
                "tiles",
                UrlTemplate::new("{z}/{x}/{y}"),
                TileLayerOptions {
                    max_zoom: 7,
                    bounds: Some(Bounds::from_coords(0.0, 0.0, 32768.0, 32768.0)),
                    ..Default::default()
                },
            )))
            .unwrap();
        h
    }

    #[test]
    fn test_each_tile_is_requested_once_while_in_flight() {
        let mut h = harness();
        for _ in 0..5 {
            h.map.render();
            h.clock.advance_ms(16);
        }

        let mut submitted: Vec<String> = h
            .executor
            .take_submitted()
            .into_iter()
            .map(|r| r.src)
            .collect();
        submitted.sort();
        assert_eq!(submitted, vec!["1/0/0", "1/0/1", "1/1/0", "1/1/1"]);
        assert!(h.map.images().is_queued("1/0/0"));
    }

    #[test]
    fn test_requests_are_prioritized_by_distance_from_center() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(10000.0, 10000.0), 3.0),
        );
        h.map
            .add_layer(Box::new(TileLayer::new(
                "tiles",
                UrlTemplate::new("{z}/{x}/{y}"),
                TileLayerOptions::default(),
            )))
            .unwrap();
        h.map.render();

        let submitted = h.executor.take_submitted();
        let priority = |src: &str| {
            submitted
                .iter()
                .find(|r| r.src == src)
                .map(|r| r.priority)
                .unwrap()
        };
        // the center lies in tile (2, 2) at level 3
        assert!(priority("3/2/2") > priority("3/0/1"));
        assert!(priority("3/2/2") > priority("3/4/3"));
    }

    #[test]
    fn test_failed_fetch_backs_off() {
        let mut h = harness();
        h.map.render();
        h.executor.complete_all(|_| None);
        h.map.pump();

        h.clock.advance_ms(1000);
        h.map.render();
        assert!(h.executor.take_submitted().is_empty());
        assert!(h.surface.images().is_empty());

        h.clock.advance_ms(5000);
        h.map.render();
        assert_eq!(h.executor.take_submitted().len(), 4);
    }

    #[test]
    fn test_unused_tiles_are_evicted() {
        let mut h = harness();
        h.map.render();
        h.complete_all();
        h.map.pump();
        h.map.render();
        assert!(h.map.images().contains("1/0/0"));

        // move away from every tile the layer can produce
        h.map
            .jump_to(&ViewRequest::new().center([500000.0, 500000.0]))
            .unwrap();
        for _ in 0..12 {
            h.clock.advance_ms(1000);
            h.map.render();
        }

        assert!(!h.map.images().contains("1/0/0"));
        assert!(h.map.images().is_empty());
    }

    #[test]
    fn test_tiles_in_use_survive_sweeps() {
        let mut h = harness();
        h.map.render();
        h.complete_all();
        h.map.pump();

        for _ in 0..15 {
            h.clock.advance_ms(1000);
            h.map.render();
        }

        assert_eq!(h.map.images().len(), 4);
        assert_eq!(h.surface.images().len(), 4);
    }
}
