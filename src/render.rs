use crate::config::*;
use crate::genome::PatternKind;
use crate::simulation::Simulation;
use bevy::prelude::*;

/// Sprite standing in for one agent slot
#[derive(Component)]
pub struct BoidSprite {
    pub slot: usize,
}

/// Inner mark showing the agent's pattern family
#[derive(Component)]
pub struct PatternMark;

/// Sprite for one nutrient source slot
#[derive(Component)]
pub struct NutrientMarker {
    pub slot: usize,
}

/// Map a world (x, z) point onto the 2D screen plane, z pointing down
pub fn world_to_screen(position: Vec3) -> Vec2 {
    Vec2::new(position.x * PIXELS_PER_UNIT, -position.z * PIXELS_PER_UNIT)
}

/// Body color from hue and value. Show-off pushes saturation up.
pub fn body_color(hue: f32, value: f32, show_off: f32) -> Color {
    let saturation = (0.45 + 0.4 * show_off).clamp(0.0, 1.0);
    Color::hsl(hue, saturation, (value * 0.8).clamp(0.05, 0.95))
}

/// Mark size relative to the body, derived from the pattern's spot size
fn pattern_mark_scale(pattern: PatternKind) -> f32 {
    (pattern.descriptor().spot_size / 14.0).clamp(0.15, 0.85)
}

/// Set a material's color. `get_mut` flags the asset for re-upload, so it is only
/// taken when the color actually differs. Returns whether anything changed.
fn recolor(materials: &mut Assets<ColorMaterial>, handle: &Handle<ColorMaterial>, color: Color) -> bool {
    if !materials.get(handle).is_some_and(|current| current.color != color) {
        return false;
    }
    match materials.get_mut(handle) {
        Some(current) => {
            current.color = color;
            true
        }
        None => false,
    }
}

/// Spawn one sprite per agent slot and nutrient slot
pub fn spawn_sprites(
    mut commands: Commands,
    simulation: Res<Simulation>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    let body = meshes.add(Circle::new(BOID_RADIUS));
    let mark = meshes.add(Circle::new(BOID_RADIUS));

    for slot in 0..simulation.agents().len() {
        let Ok(tint) = simulation.tint(slot) else {
            continue;
        };
        let color = body_color(tint.hue, tint.value, tint.show_off);
        commands
            .spawn((
                BoidSprite { slot },
                Mesh2d(body.clone()),
                MeshMaterial2d(materials.add(ColorMaterial::from_color(color))),
                Transform::from_xyz(0.0, 0.0, 1.0),
            ))
            .with_children(|parent| {
                parent.spawn((
                    PatternMark,
                    Mesh2d(mark.clone()),
                    MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgba(0.05, 0.05, 0.1, 0.7)))),
                    Transform::from_xyz(0.0, 0.0, 0.1),
                ));
            });
    }

    let nutrient = meshes.add(Circle::new(NUTRIENT_RADIUS));
    for slot in 0..simulation.nutrients().capacity() {
        commands.spawn((
            NutrientMarker { slot },
            Mesh2d(nutrient.clone()),
            MeshMaterial2d(materials.add(ColorMaterial::from_color(Color::srgb(0.2, 0.8, 0.2)))),
            Transform::from_xyz(0.0, 0.0, 0.0),
            Visibility::Hidden,
        ));
    }

    info!(
        "Spawned {} agent sprites and {} nutrient markers",
        simulation.agents().len(),
        simulation.nutrients().capacity()
    );
}

/// Copy agent transforms onto their sprites
pub fn sync_boid_sprites(
    simulation: Res<Simulation>,
    mut sprites: Query<(&BoidSprite, &mut Transform, &mut Visibility)>,
) {
    for (sprite, mut transform, mut visibility) in sprites.iter_mut() {
        let Ok(agent) = simulation.transform(sprite.slot) else {
            continue;
        };
        let screen = world_to_screen(agent.position);
        transform.translation.x = screen.x;
        transform.translation.y = screen.y;
        transform.scale = Vec3::splat(agent.scale);

        // Heading on the x-z plane becomes a rotation about the screen normal
        let forward = agent.orientation * Vec3::Z;
        transform.rotation = Quat::from_rotation_z((-forward.z).atan2(forward.x));

        *visibility = if agent.visible { Visibility::Inherited } else { Visibility::Hidden };
    }
}

/// Recolor sprites whose genome changed since the last frame
pub fn sync_boid_colors(
    simulation: Res<Simulation>,
    sprites: Query<(&BoidSprite, &MeshMaterial2d<ColorMaterial>, &Children)>,
    mut marks: Query<&mut Transform, With<PatternMark>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
) {
    for (sprite, material, children) in sprites.iter() {
        let Ok(tint) = simulation.tint(sprite.slot) else {
            continue;
        };
        recolor(&mut materials, &material.0, body_color(tint.hue, tint.value, tint.show_off));
        for &child in children.iter() {
            if let Ok(mut transform) = marks.get_mut(child) {
                transform.scale = Vec3::splat(pattern_mark_scale(tint.pattern));
            }
        }
    }
}

pub fn sync_nutrient_markers(
    simulation: Res<Simulation>,
    mut markers: Query<(&NutrientMarker, &mut Transform, &mut Visibility)>,
) {
    let sources = simulation.nutrients().sources();
    for (marker, mut transform, mut visibility) in markers.iter_mut() {
        match sources.get(marker.slot) {
            Some(source) if source.active => {
                let screen = world_to_screen(source.position);
                transform.translation.x = screen.x;
                transform.translation.y = screen.y;
                transform.scale = Vec3::splat(source.strength.clamp(0.2, 1.0));
                *visibility = Visibility::Inherited;
            }
            _ => *visibility = Visibility::Hidden,
        }
    }
}
