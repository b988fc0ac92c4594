#[cfg(all(test, feature = "tokio-runtime"))]
mod fetch_pool_tests {
    use async_trait::async_trait;
    use mapview::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves solid tiles, failing any source that contains "missing"
    #[derive(Default)]
    struct FakeFetcher {
        fetched: Mutex<Vec<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, src: &str) -> Result<Image> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut fetched) = self.fetched.lock() {
                fetched.push(src.to_string());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
            if src.contains("missing") {
                return Err(MapError::Fetch(format!("no such image: {}", src)));
            }
            Ok(Image::solid(256, 256, Color::WHITE))
        }
    }

    fn build_map(fetcher: Arc<FakeFetcher>, surface: RecordingSurface) -> Map {
        let pool = FetchPool::new(fetcher, FetchPoolConfig { max_concurrency: 2 });
        MapBuilder::new()
            .with_options(MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            })
            .with_view(View::new(Point::new(16384.0, 16384.0), 1.0))
            .with_surface(Box::new(surface))
            .with_executor(Box::new(pool))
            .build()
            .unwrap()
    }

    async fn pump_until(map: &mut Map, expected: usize) -> usize {
        let mut arrived = 0;
        for _ in 0..200 {
            arrived += map.pump();
            if arrived >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        arrived
    }

    #[tokio::test]
    async fn test_tiles_load_through_the_pool() {
        let _ = env_logger::builder().is_test(true).try_init();

        let fetcher = Arc::new(FakeFetcher::default());
        let surface = RecordingSurface::new();
        let mut map = build_map(fetcher.clone(), surface.clone());
        map.add_layer(Box::new(TileLayer::new(
            "tiles",
            UrlTemplate::new("{z}/{x}/{y}"),
            TileLayerOptions {
                max_zoom: 7,
                bounds: Some(Bounds::from_coords(0.0, 0.0, 32768.0, 32768.0)),
                ..Default::default()
            },
        )))
        .unwrap();

        map.render();
        assert!(surface.images().is_empty());

        assert_eq!(pump_until(&mut map, 4).await, 4);
        map.render();
        assert_eq!(surface.images().len(), 4);

        // everything is cached now; another frame fetches nothing
        map.render();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_failed_icon_is_not_drawn() {
        let fetcher = Arc::new(FakeFetcher::default());
        let surface = RecordingSurface::new();
        let mut map = build_map(fetcher.clone(), surface.clone());

        let mut markers = MarkerLayer::new(
            "pins",
            MarkerLayerOptions {
                icon: "pin.png".into(),
                ..Default::default()
            },
        );
        markers.add([
            Marker::new("ok", [16384.0, 16384.0]),
            Marker::new("broken", [16400.0, 16384.0]).with_icon("missing.png"),
        ]);
        map.add_layer(Box::new(markers)).unwrap();

        map.render();
        assert_eq!(pump_until(&mut map, 2).await, 2);
        map.render();

        let images = surface.images();
        assert_eq!(images.len(), 1);
        let (_, _, dest) = &images[0];
        assert_eq!(dest.width(), 256.0);
        assert!(map.images().contains("pin.png"));
        assert!(!map.images().contains("missing.png"));
    }
}
