mod common;

#[cfg(test)]
mod integration_tests {
    use super::common::{approx, Harness};
    use mapview::constants::WHEEL_DELTA_STEP;
    use mapview::prelude::*;
    use mapview::rendering::DrawCommand;
    use std::sync::Mutex;

    fn snapped_options() -> MapOptions {
        MapOptions {
            min_zoom: 1.0,
            max_zoom: 7.0,
            zoom_snap: 0.5,
            ..Default::default()
        }
    }

    fn tile_layer() -> Box<TileLayer> {
        Box::new(TileLayer::new(
            "tiles",
            UrlTemplate::new("{z}/{x}/{y}"),
            TileLayerOptions {
                max_zoom: 7,
                ..Default::default()
            },
        ))
    }

    #[test]
    fn test_jump_then_ease_keeps_aligned_center() {
        let mut h = Harness::new(snapped_options(), View::new(Point::new(0.0, 0.0), 1.0));
        h.frames();

        let target = Point::new(49432.0, 31440.0);
        let view = h
            .map
            .jump_to(&ViewRequest::new().center(target).zoom(2.5))
            .unwrap();
        assert_eq!(view.zoom, 2.5);

        // the aligned center is within half a pixel of the request
        let scale = 2f64.powf(2.5) / 128.0;
        assert!(approx(view.center.x, target.x, 0.5 / scale));
        assert!(approx(view.center.y, target.y, 0.5 / scale));
        let origin = Point::new(400.0, 300.0).subtract(&h.map.project(&view.center));
        assert!(approx(origin.x, origin.x.round(), 1e-6));
        assert!(approx(origin.y, origin.y.round(), 1e-6));

        h.map
            .ease_to(&ViewRequest::new().zoom(3.0), EaseOptions::from_millis(2000))
            .unwrap();
        h.run_for(1000);
        let midway = h.map.view();
        assert!(midway.zoom > 2.5 && midway.zoom < 3.0);

        h.run_for(1100);
        assert!(!h.map.is_animating());
        assert_eq!(h.map.view().zoom, 3.0);
        assert_eq!(h.map.view().center, view.center);

        let snapped = h.map.jump_to(&ViewRequest::new().zoom(2.7)).unwrap();
        assert_eq!(snapped.zoom, 2.5);
    }

    #[test]
    fn test_contain_fits_bounds() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(0.0, 0.0), 1.0),
        );

        // 1600x800 map units at native zoom 7: width binds at zoom 6
        let bounds = Bounds::from_coords(0.0, 0.0, 1600.0, 800.0);
        let view = h.map.jump_to(&ViewRequest::new().contain(bounds)).unwrap();
        assert!(approx(view.zoom, 6.0, 1e-9));
        assert!(approx(view.center.x, 800.0, 1.0));
        assert!(approx(view.center.y, 400.0, 1.0));
    }

    #[test]
    fn test_tiles_fall_back_to_cached_parents() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(16384.0, 16384.0), 1.0),
        );
        h.map.add_layer(tile_layer()).unwrap();

        h.map.render();
        assert!(h.surface.images().is_empty());
        assert_eq!(h.complete_all(), 9);
        assert_eq!(h.map.pump(), 9);

        h.map.render();
        let level_one = h.surface.images();
        assert_eq!(level_one.len(), 9);
        assert!(level_one.iter().all(|(_, src, _)| src.width() == 256.0));

        h.map.jump_to(&ViewRequest::new().zoom(2.0)).unwrap();
        h.map.render();
        let fallback = h.surface.images();
        assert_eq!(fallback.len(), 16);
        assert!(fallback.iter().all(|(_, src, _)| src.width() == 128.0));
        assert!(fallback.iter().all(|(_, _, dest)| approx(dest.width(), 256.0, 1e-6)));

        assert_eq!(h.complete_all(), 16);
        h.map.pump();
        h.map.render();
        let level_two = h.surface.images();
        assert_eq!(level_two.len(), 16);
        assert!(level_two.iter().all(|(_, src, _)| src.width() == 256.0));
    }

    #[test]
    fn test_missing_tiles_are_marked_in_debug() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                debug: true,
                ..Default::default()
            },
            View::new(Point::new(16384.0, 16384.0), 1.0),
        );
        h.map.add_layer(tile_layer()).unwrap();
        h.map.render();

        let commands = h.surface.commands();
        let missing = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { color, .. } if *color == Color::DEBUG_MISSING))
            .count();
        let outlines = commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::StrokeRect { .. }))
            .count();
        assert_eq!(missing, 9);
        assert_eq!(outlines, 9);
    }

    fn marker_harness() -> Harness {
        // native zoom 7 at zoom 7: map units are canvas pixels
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(400.0, 300.0), 7.0),
        );
        let mut layer = MarkerLayer::new(
            "pins",
            MarkerLayerOptions {
                icon: "pin.png".into(),
                icon_size: Some(Point::new(20.0, 20.0)),
                ..Default::default()
            },
        );
        layer.add([
            Marker::new("below", [100.0, 100.0]),
            Marker::new("above", [105.0, 100.0]),
            Marker::new("lonely", [600.0, 400.0]),
        ]);
        h.map.add_layer(Box::new(layer)).unwrap();
        h
    }

    #[test]
    fn test_hit_test_prefers_topmost_marker() {
        let h = marker_harness();

        let hit = h.map.hit_test(&Point::new(102.0, 100.0)).unwrap();
        assert_eq!(hit.layer_id, "pins");
        assert_eq!(hit.item_id, "above");

        let hit = h.map.hit_test(&Point::new(92.0, 100.0)).unwrap();
        assert_eq!(hit.item_id, "below");

        assert!(h.map.hit_test(&Point::new(300.0, 300.0)).is_none());
    }

    #[test]
    fn test_marker_icons_are_drawn_centered() {
        let mut h = marker_harness();
        h.map.render();
        assert_eq!(h.complete_all(), 1);
        h.map.pump();
        h.map.render();

        let images = h.surface.images();
        assert_eq!(images.len(), 3);
        let (_, _, dest) = &images[2];
        assert_eq!(*dest, Bounds::from_coords(590.0, 390.0, 610.0, 410.0));
    }

    #[test]
    fn test_hover_and_click_events() {
        let mut h = marker_harness();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for kind in ["marker.over", "marker.leave", "marker.click"] {
            let seen = seen.clone();
            h.map.on(kind, move |event| {
                if let Ok(mut seen) = seen.lock() {
                    seen.push(event.kind().to_string());
                }
            });
        }

        h.send(InputEvent::pointer_move([600.0, 400.0]));
        h.send(InputEvent::pointer_move([601.0, 401.0]));
        h.send(InputEvent::pointer_move([300.0, 300.0]));
        h.send(InputEvent::pointer_down([600.0, 400.0]));
        h.send(InputEvent::pointer_up([600.0, 400.0]));

        let events = h.map.process_events();
        assert_eq!(
            events,
            vec![
                MapEvent::MarkerOver {
                    layer_id: "pins".into(),
                    marker_id: "lonely".into()
                },
                MapEvent::MarkerLeave {
                    layer_id: "pins".into(),
                    marker_id: "lonely".into()
                },
                MapEvent::MarkerClick {
                    layer_id: "pins".into(),
                    marker_id: "lonely".into()
                },
            ]
        );
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["marker.over", "marker.leave", "marker.click"]
        );
    }

    #[test]
    fn test_hover_moves_between_markers() {
        let mut h = marker_harness();
        h.send(InputEvent::pointer_move([92.0, 100.0]));
        h.send(InputEvent::pointer_move([112.0, 100.0]));

        let kinds: Vec<&str> = h.map.process_events().iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["marker.over", "marker.leave", "marker.over"]);
    }

    #[test]
    fn test_drag_pans_and_release_throws() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 7.0),
        );
        h.frames();

        h.send(InputEvent::pointer_down([400.0, 300.0]));
        h.clock.advance_ms(16);
        h.send(InputEvent::pointer_move([450.0, 300.0]));
        assert_eq!(h.map.view().center, Point::new(950.0, 1000.0));

        h.clock.advance_ms(16);
        h.send(InputEvent::pointer_move([500.0, 300.0]));
        h.clock.advance_ms(16);
        h.send(InputEvent::pointer_up([500.0, 300.0]));

        assert!(h.map.is_animating());
        let released = h.map.view().center;
        h.run_for(1000);
        assert!(!h.map.is_animating());
        // momentum keeps moving the map the way it was dragged
        assert!(h.map.view().center.x < released.x);
    }

    #[test]
    fn test_slow_release_does_not_throw() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 7.0),
        );

        h.send(InputEvent::pointer_down([400.0, 300.0]));
        h.clock.advance_ms(16);
        h.send(InputEvent::pointer_move([450.0, 300.0]));
        // held still past the sample window
        h.clock.advance_ms(500);
        h.send(InputEvent::pointer_up([450.0, 300.0]));
        assert!(!h.map.is_animating());
    }

    #[test]
    fn test_wheel_steps_retarget_running_zoom() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 4.0),
        );
        h.frames();

        let scale: f64 = 2.0 / (1.0 + (-WHEEL_DELTA_STEP / 450.0).exp());
        h.send(InputEvent::wheel([400.0, 300.0], -WHEEL_DELTA_STEP));
        assert!(h.map.is_animating());

        h.run_for(48);
        h.send(InputEvent::wheel([400.0, 300.0], -WHEEL_DELTA_STEP));
        h.run_for(400);

        assert!(!h.map.is_animating());
        assert!(approx(h.map.view().zoom, 4.0 + 2.0 * scale.log2(), 1e-12));
    }

    #[test]
    fn test_ambiguous_scroll_resolves_on_a_later_frame() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 4.0),
        );
        h.frames();

        h.send(InputEvent::wheel([400.0, 300.0], 100.0));
        assert!(!h.map.is_animating());
        assert_eq!(h.host.pending_frames(), 1);

        h.run_for(500);
        assert!(h.map.view().zoom < 4.0);
    }

    #[test]
    fn test_double_click_zooms_around_pointer() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 4.0),
        );
        let anchor = h.map.canvas_to_map(&Point::new(600.0, 300.0));

        h.send(InputEvent::double_click([600.0, 300.0]));
        h.run_for(600);
        assert_eq!(h.map.view().zoom, 5.0);

        // the point under the cursor stays within a pixel of it
        let pixel = h.map.map_to_canvas(&anchor);
        assert!(approx(pixel.x, 600.0, 1.0));
        assert!(approx(pixel.y, 300.0, 1.0));

        h.send(InputEvent::DoubleClick {
            position: Point::new(600.0, 300.0),
            modifiers: Modifiers::shift(),
        });
        h.run_for(600);
        assert_eq!(h.map.view().zoom, 4.0);
    }

    #[test]
    fn test_resize_event_changes_canvas() {
        let mut h = Harness::new(
            MapOptions {
                max_zoom: 7.0,
                ..Default::default()
            },
            View::new(Point::new(1000.0, 1000.0), 4.0),
        );
        h.send(InputEvent::Resize {
            size: Point::new(1024.0, 768.0),
        });
        h.frames();
        assert_eq!(h.map.size(), Point::new(1024.0, 768.0));
        assert_eq!(h.surface.size(), Point::new(1024.0, 768.0));
    }
}
