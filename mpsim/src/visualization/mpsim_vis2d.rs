use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::{PrimaryWindow, WindowResized};
use log::{error, info};

use crate::simulation::field::Viewport;
use crate::simulation::scenario::Simulation;
use crate::simulation::states::NVec2;

/// Sprite showing the basin field
#[derive(Component)]
struct FieldSprite;

/// Texture the field is painted into
#[derive(Resource)]
struct FieldImage(Handle<Image>);

/// Paces the replay of the traced trajectory
#[derive(Resource)]
struct ReplayTimer(Timer);

const MAGNET_RADIUS: f32 = 6.0; // screen pixels
const BOB_RADIUS: f32 = 4.0;
const UNSETTLED_SHADE: f32 = 0.35; // brightness of particles still moving
const SAVE_PATH: &str = "mpsim_saved.par";
const TITLE: &str = "mpsim";

pub fn run_2d(sim: Simulation) {
    info!(
        "run_2d: starting viewer with {} magnets, {} field particles",
        sim.magnets().len(),
        sim.field().len()
    );
    let interval = sim.engine.replay_interval_ms.max(1) as f32 / 1000.0;

    App::new()
        .insert_resource(sim)
        .insert_resource(ReplayTimer(Timer::from_seconds(interval, TimerMode::Repeating)))
        // env_logger owns the `log` facade
        .add_plugins(DefaultPlugins.build().disable::<bevy::log::LogPlugin>())
        .add_systems(Startup, setup_system)
        .add_systems(
            Update,
            (
                resize_system,
                input_system,
                field_step_system,
                replay_step_system,
                paint_field_system,
                draw_overlay_system,
                title_system,
            )
                .chain(),
        )
        .run();
}

fn blank_image(width: u32, height: u32) -> Image {
    Image::new_fill(
        Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        &[0, 0, 0, 255],
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::MAIN_WORLD | RenderAssetUsages::RENDER_WORLD,
    )
}

fn setup_system(
    mut commands: Commands,
    mut sim: ResMut<Simulation>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut images: ResMut<Assets<Image>>,
) {
    // 2D camera
    commands.spawn(Camera2dBundle {
        camera: Camera {
            clear_color: ClearColorConfig::Custom(Color::srgb(0.0, 0.0, 0.0)),
            ..Default::default()
        },
        ..Default::default()
    });

    // match the field to the window before the first frame
    let mut size = None;
    if let Ok(window) = windows.get_single() {
        let step = sim.engine.field_downsample.max(1);
        sim.resize(window.width() as u32 / step, window.height() as u32 / step);
        size = Some(Vec2::new(window.width(), window.height()));
    }

    let vp = *sim.field().viewport();
    let handle = images.add(blank_image(vp.width, vp.height));
    commands.insert_resource(FieldImage(handle.clone()));

    commands.spawn((
        SpriteBundle {
            texture: handle,
            sprite: Sprite {
                custom_size: size,
                ..Default::default()
            },
            ..Default::default()
        },
        FieldSprite,
    ));
}

/// Rebuild the field at the new window size, one particle per
/// `field_downsample` pixels in each direction
fn resize_system(
    mut events: EventReader<WindowResized>,
    mut sim: ResMut<Simulation>,
    field_image: Res<FieldImage>,
    mut images: ResMut<Assets<Image>>,
    mut sprites: Query<&mut Sprite, With<FieldSprite>>,
) {
    let Some(ev) = events.read().last() else {
        return;
    };
    let step = sim.engine.field_downsample.max(1);
    let cols = (ev.width as u32) / step;
    let rows = (ev.height as u32) / step;
    if cols == 0 || rows == 0 {
        return;
    }
    sim.resize(cols, rows);

    if let Some(image) = images.get_mut(&field_image.0) {
        *image = blank_image(cols, rows);
    }
    for mut sprite in &mut sprites {
        sprite.custom_size = Some(Vec2::new(ev.width, ev.height));
    }
    info!("field resized to {cols}x{rows}");
}

fn input_system(
    keys: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut sim: ResMut<Simulation>,
) {
    // field transport
    if keys.just_pressed(KeyCode::KeyP) {
        sim.field_transport.play();
    }
    if keys.just_pressed(KeyCode::Space) {
        sim.field_transport.step();
    }

    // replay transport; starting over from the end rewinds first
    if keys.just_pressed(KeyCode::KeyA) {
        if !sim.replay_transport.is_running() && sim.replay().index() + 1 >= sim.trajectory().len() {
            sim.reset_replay();
        }
        sim.replay_transport.play();
    }

    if keys.just_pressed(KeyCode::KeyR) {
        sim.reset();
        info!("simulation reset");
    }
    if keys.just_pressed(KeyCode::KeyS) {
        if let Err(e) = sim.save_params(SAVE_PATH) {
            error!("{e}");
        }
    }

    if buttons.just_pressed(MouseButton::Middle) {
        sim.clear_trajectory();
    }
    if buttons.just_pressed(MouseButton::Left) {
        let Ok(window) = windows.get_single() else {
            return;
        };
        let Some(cursor) = window.cursor_position() else {
            return;
        };
        let vp = Viewport::new(window.width() as u32, window.height() as u32, sim.parameters());
        let p = vp.pixel_to_position(cursor.x as f64, cursor.y as f64);
        let n = sim.set_seed(p.x, p.y);
        info!("traced {n} points from ({:.4}, {:.4})", p.x, p.y);
    }
}

fn field_step_system(mut sim: ResMut<Simulation>) {
    sim.field_tick();
}

fn replay_step_system(time: Res<Time>, mut timer: ResMut<ReplayTimer>, mut sim: ResMut<Simulation>) {
    timer.0.tick(time.delta());
    for _ in 0..timer.0.times_finished_this_tick() {
        let dt = timer.0.duration().as_secs_f64();
        if !sim.replay_tick(dt) {
            break;
        }
    }
}

/// Color each pixel by its particle's nearest magnet, dimmed while moving
fn paint_field_system(sim: Res<Simulation>, field_image: Res<FieldImage>, mut images: ResMut<Assets<Image>>) {
    let Some(image) = images.get_mut(&field_image.0) else {
        return;
    };
    let vp = *sim.field().viewport();
    let (w, h) = (vp.width as usize, vp.height as usize);
    if image.data.len() != w * h * 4 {
        return;
    }

    let basins = sim.basins();
    let settled = sim.field().settle_ticks();
    let magnets = sim.magnets();

    for (i, basin) in basins.iter().enumerate() {
        let (col, row) = (i % w, i / w);
        // field rows run bottom-up, image rows top-down
        let px = ((h - 1 - row) * w + col) * 4;
        let shade = if settled[i].is_some() { 1.0 } else { UNSETTLED_SHADE };
        let rgb = basin.map(|k| magnets[k].color).unwrap_or([0.0; 3]);
        for c in 0..3 {
            image.data[px + c] = (rgb[c] * shade * 255.0).clamp(0.0, 255.0) as u8;
        }
        image.data[px + 3] = 255;
    }
}

/// Plane position to world coordinates of the default 2D camera
fn to_screen(p: &NVec2, vp: &Viewport, window: &Window) -> Vec2 {
    Vec2::new(
        (p.x / vp.rmax_x) as f32 * window.width() * 0.5,
        (p.y / vp.rmax_y) as f32 * window.height() * 0.5,
    )
}

fn draw_overlay_system(sim: Res<Simulation>, windows: Query<&Window, With<PrimaryWindow>>, mut gizmos: Gizmos) {
    let Ok(window) = windows.get_single() else {
        return;
    };
    let vp = *sim.field().viewport();

    for m in sim.magnets() {
        let c = Color::srgb(m.color[0], m.color[1], m.color[2]);
        gizmos.circle_2d(to_screen(&m.pos.xy(), &vp, window), MAGNET_RADIUS, c);
    }

    if sim.trajectory().len() > 1 {
        let points = sim.trajectory_positions();
        gizmos.linestrip_2d(
            points.iter().map(|p| to_screen(p, &vp, window)),
            Color::srgb(1.0, 1.0, 1.0),
        );
        let bob = to_screen(&sim.replay().position(), &vp, window);
        gizmos.circle_2d(bob, BOB_RADIUS, Color::srgb(1.0, 1.0, 0.0));
    }
}

/// Window title carrying the field step counter
pub fn window_title(sim: &Simulation) -> String {
    format!("{TITLE} | field steps: {}", sim.field().ticks())
}

fn title_system(sim: Res<Simulation>, mut windows: Query<&mut Window, With<PrimaryWindow>>) {
    let Ok(mut window) = windows.get_single_mut() else {
        return;
    };
    let title = window_title(&sim);
    // only touch the window when the text changes
    if window.title != title {
        window.title = title;
    }
}
