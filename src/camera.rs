use crate::config::{DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM, PIXELS_PER_UNIT, WORLD_HALF_EXTENT};
use bevy::input::mouse::{MouseMotion, MouseWheel};
use bevy::prelude::*;

#[derive(Component)]
pub struct MainCamera;

/// Zoom and pan of the top-down view
#[derive(Resource)]
pub struct CameraState {
    pub zoom: f32,
    pub position: Vec2,
    pub is_panning: bool,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            zoom: DEFAULT_ZOOM,
            position: Vec2::ZERO,
            is_panning: false,
        }
    }
}

impl CameraState {
    /// Apply a scroll delta, keeping zoom within bounds
    pub fn zoom_by(&mut self, scroll: f32) {
        self.zoom = (self.zoom - scroll * 0.1).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Move by a screen-space drag. The camera is kept over the world.
    pub fn pan_by(&mut self, drag: Vec2) {
        let limit = WORLD_HALF_EXTENT * PIXELS_PER_UNIT;
        let delta = Vec2::new(-drag.x, drag.y) * self.zoom;
        self.position = (self.position + delta).clamp(Vec2::splat(-limit), Vec2::splat(limit));
    }
}

pub fn setup_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        MainCamera,
        Transform::from_xyz(0.0, 0.0, 0.0),
        OrthographicProjection {
            scale: DEFAULT_ZOOM,
            ..OrthographicProjection::default_2d()
        },
    ));
}

pub fn camera_zoom(
    mut scroll_events: EventReader<MouseWheel>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut OrthographicProjection, With<MainCamera>>,
) {
    for event in scroll_events.read() {
        camera_state.zoom_by(event.y);
        if let Ok(mut projection) = query.get_single_mut() {
            projection.scale = camera_state.zoom;
        }
    }
}

/// Middle-drag pans the view
pub fn camera_pan(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut motion_events: EventReader<MouseMotion>,
    mut camera_state: ResMut<CameraState>,
    mut query: Query<&mut Transform, With<MainCamera>>,
) {
    if mouse_button.just_pressed(MouseButton::Middle) {
        camera_state.is_panning = true;
    }
    if mouse_button.just_released(MouseButton::Middle) {
        camera_state.is_panning = false;
    }

    if !camera_state.is_panning {
        motion_events.clear();
        return;
    }
    for event in motion_events.read() {
        camera_state.pan_by(event.delta);
    }
    if let Ok(mut transform) = query.get_single_mut() {
        transform.translation.x = camera_state.position.x;
        transform.translation.y = camera_state.position.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_stays_in_bounds() {
        let mut state = CameraState::default();
        for _ in 0..200 {
            state.zoom_by(-1.0);
        }
        assert_eq!(state.zoom, MAX_ZOOM);
        for _ in 0..200 {
            state.zoom_by(1.0);
        }
        assert_eq!(state.zoom, MIN_ZOOM);
    }

    #[test]
    fn pan_is_limited_to_the_world() {
        let mut state = CameraState::default();
        state.pan_by(Vec2::new(-1.0e6, 0.0));
        assert_eq!(state.position.x, WORLD_HALF_EXTENT * PIXELS_PER_UNIT);
        assert_eq!(state.position.y, 0.0);
    }
}
