use async_trait::async_trait;
use mapview::prelude::*;
use mapview::rendering::DrawCommand;

/// Paints every tile a shade derived from its address, so no network is needed
struct CheckerFetcher;

#[async_trait]
impl ImageFetcher for CheckerFetcher {
    async fn fetch(&self, src: &str) -> mapview::Result<Image> {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let shade = src.bytes().fold(0u8, |acc, b| acc.wrapping_mul(31).wrapping_add(b));
        Ok(Image::solid(256, 256, Color::rgb(shade, 255 - shade, 128)))
    }
}

/// Advances the clock in frame-sized steps, running whatever the host scheduled
async fn drive(map: &mut Map, host: &ManualHost, clock: &ManualClock, ms: u64) {
    let mut elapsed = 0;
    while elapsed < ms {
        tokio::time::sleep(Duration::from_millis(16)).await;
        clock.advance_ms(16);
        elapsed += 16;

        map.pump();
        for frame in host.take_frames() {
            map.on_animation_frame(frame);
        }
        for timer in host.take_due_timers() {
            map.on_timer(timer);
        }
    }
}

fn describe(map: &Map, surface: &RecordingSurface) {
    let view = map.view();
    let commands = surface.commands();
    let images = commands
        .iter()
        .filter(|c| matches!(c, DrawCommand::Image { .. }))
        .count();
    println!(
        "   center ({:.1}, {:.1}) zoom {:.3} | frame {} | {} images drawn | {} cached",
        view.center.x,
        view.center.y,
        view.zoom,
        map.frame_count(),
        images,
        map.images().len()
    );
}

/// Drives a map without a window: tiles come from a generated source, frames
/// from a manual host
#[tokio::main]
async fn main() -> mapview::Result<()> {
    env_logger::init();

    println!("🗺️ mapview headless demo");
    println!("========================");

    let clock = ManualClock::new();
    let host = ManualHost::new(Arc::new(clock.clone()));
    let surface = RecordingSurface::new();
    let pool = FetchPool::new(Arc::new(CheckerFetcher), FetchPoolConfig::default());

    let mut map = MapBuilder::new()
        .with_options_json(
            r#"{
                "min_zoom": 0,
                "max_zoom": 7,
                "zoom_snap": 0.25,
                "bounds": { "min": { "x": 0, "y": 0 }, "max": { "x": 32768, "y": 32768 } }
            }"#,
        )?
        .with_size(Point::new(1024.0, 768.0))
        .with_view(View::new(Point::new(16384.0, 16384.0), 1.0))
        .with_clock(Arc::new(clock.clone()))
        .with_host(Box::new(host.clone()))
        .with_surface(Box::new(surface.clone()))
        .with_executor(Box::new(pool))
        .build()?;

    let bounds = map.options().bounds;
    map.add_layer(Box::new(TileLayer::new(
        "base",
        UrlTemplate::new("generated://{z}/{x}/{y}"),
        TileLayerOptions {
            max_zoom: 7,
            bounds,
            ..Default::default()
        },
    )))?;

    let mut pins = MarkerLayer::new(
        "pins",
        MarkerLayerOptions {
            icon: "generated://pin".into(),
            icon_size: Some(Point::new(24.0, 24.0)),
            spatial_index: true,
            ..Default::default()
        },
    );
    pins.add((0..16).map(|i| {
        let offset = i as f64 * 2048.0;
        Marker::new(format!("pin-{}", i), [offset, 32768.0 - offset])
    }));
    map.add_layer(Box::new(pins))?;

    map.on("marker.click", |event| {
        println!("   👆 {:?}", event);
    });

    println!("\n📦 Initial load:");
    drive(&mut map, &host, &clock, 500).await;
    describe(&map, &surface);

    println!("\n🔍 Easing to zoom 3:");
    map.ease_to(
        &ViewRequest::new().center([8192.0, 8192.0]).zoom(3.0),
        EaseOptions::from_millis(600),
    )?;
    drive(&mut map, &host, &clock, 300).await;
    describe(&map, &surface);
    drive(&mut map, &host, &clock, 700).await;
    describe(&map, &surface);

    println!("\n🖱️ Wheel and drag:");
    map.handle_event(InputEvent::wheel([512.0, 384.0], -WHEEL_STEP * 3.0))?;
    drive(&mut map, &host, &clock, 400).await;
    describe(&map, &surface);

    map.handle_event(InputEvent::pointer_down([512.0, 384.0]))?;
    for step in 1..=5 {
        clock.advance_ms(16);
        map.handle_event(InputEvent::pointer_move([512.0 - step as f64 * 30.0, 384.0]))?;
    }
    map.handle_event(InputEvent::pointer_up([362.0, 384.0]))?;
    drive(&mut map, &host, &clock, 800).await;
    describe(&map, &surface);

    println!("\n🎯 Fitting the whole map:");
    map.jump_to(&ViewRequest::new().contain(Bounds::from_coords(0.0, 0.0, 32768.0, 32768.0)))?;
    drive(&mut map, &host, &clock, 200).await;
    describe(&map, &surface);

    let pin = map.map_to_canvas(&Point::new(16384.0, 16384.0));
    map.handle_event(InputEvent::pointer_down(pin))?;
    map.handle_event(InputEvent::pointer_up(pin))?;
    map.process_events();

    println!("\n✅ Done");
    Ok(())
}

const WHEEL_STEP: f64 = mapview::constants::WHEEL_DELTA_STEP;
