//! Surface looks laid over every mesh of a loaded glTF scene.
//!
//! Furniture is drawn as pale translucent glass with a faint glow, the wall
//! screens glow white, and avatars keep their own colours under a soft grey
//! glow. Scene roots opt in with a `StyledScene` tag (behind the `render`
//! feature); each mesh material under the tag is swapped for a styled copy.

/// Light grey shared by the furniture and the avatar glow.
pub const LIGHT_GREY: [u8; 3] = [0xd3, 0xd3, 0xd3];
/// Screen white.
pub const WHITE: [u8; 3] = [0xff, 0xff, 0xff];

/// Material overrides for one kind of model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialStyle {
    /// Replacement base colour as sRGB bytes; `None` keeps the asset's.
    pub base_color: Option<[u8; 3]>,
    /// Emissive colour as sRGB bytes.
    pub emissive: [u8; 3],
    /// Multiplier on the emissive colour.
    pub emissive_intensity: f32,
    /// Replacement opacity; `None` keeps the asset's alpha and blending.
    pub opacity: Option<f32>,
}

impl MaterialStyle {
    /// Whether meshes wearing this style must be alpha blended.
    #[must_use]
    pub const fn is_translucent(self) -> bool {
        match self.opacity {
            Some(opacity) => opacity < 1.0,
            None => false,
        }
    }
}

/// Which look a model gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceStyle {
    /// Desks and monitors.
    Furniture,
    /// Wall screens.
    Screen,
    /// Walking avatars, whichever variant.
    Avatar,
}

impl SurfaceStyle {
    /// Overrides applied for this look.
    #[must_use]
    pub const fn material(self) -> MaterialStyle {
        match self {
            Self::Furniture => MaterialStyle {
                base_color: Some(LIGHT_GREY),
                emissive: LIGHT_GREY,
                emissive_intensity: 0.3,
                opacity: Some(0.5),
            },
            Self::Screen => MaterialStyle {
                base_color: Some(WHITE),
                emissive: WHITE,
                emissive_intensity: 0.6,
                opacity: Some(1.0),
            },
            Self::Avatar => MaterialStyle {
                base_color: None,
                emissive: LIGHT_GREY,
                emissive_intensity: 1.3,
                opacity: None,
            },
        }
    }
}

#[cfg(feature = "render")]
pub use plugin::{restyle_scene_materials_system, styled_material, MaterialStylePlugin, StyledScene};

#[cfg(feature = "render")]
mod plugin {
    use bevy::prelude::*;
    use hashbrown::hash_map::Entry;
    use hashbrown::HashMap;
    use log::debug;

    use super::{MaterialStyle, SurfaceStyle};

    /// Tags a scene root whose meshes wear a [`SurfaceStyle`].
    #[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StyledScene(pub SurfaceStyle);

    /// Copy of `source` with `style` laid over it.
    #[must_use]
    pub fn styled_material(source: &StandardMaterial, style: MaterialStyle) -> StandardMaterial {
        let mut material = source.clone();
        if let Some([red, green, blue]) = style.base_color {
            let alpha = material.base_color.alpha();
            material.base_color = Color::srgb_u8(red, green, blue).with_alpha(alpha);
        }
        let [glow_red, glow_green, glow_blue] = style.emissive;
        material.emissive =
            Color::srgb_u8(glow_red, glow_green, glow_blue).to_linear() * style.emissive_intensity;
        if let Some(opacity) = style.opacity {
            material.base_color.set_alpha(opacity);
            material.alpha_mode = if style.is_translucent() {
                AlphaMode::Blend
            } else {
                AlphaMode::Opaque
            };
        }
        material
    }

    type StyledCopies = HashMap<(AssetId<StandardMaterial>, SurfaceStyle), Handle<StandardMaterial>>;

    /// Swaps each new mesh material under a [`StyledScene`] for a styled copy.
    ///
    /// One copy is made per source material and style, however many scene
    /// instances share it.
    pub fn restyle_scene_materials_system(
        mut meshes: Query<
            (Entity, &mut MeshMaterial3d<StandardMaterial>),
            Added<MeshMaterial3d<StandardMaterial>>,
        >,
        parents: Query<&ChildOf>,
        roots: Query<&StyledScene>,
        mut materials: ResMut<Assets<StandardMaterial>>,
        mut copies: Local<StyledCopies>,
    ) {
        for (entity, mut material) in &mut meshes {
            let Some(StyledScene(style)) = parents
                .iter_ancestors(entity)
                .find_map(|ancestor| roots.get(ancestor).ok())
                .copied()
            else {
                continue;
            };
            let key = (material.0.id(), style);
            let handle = match copies.entry(key) {
                Entry::Occupied(slot) => slot.get().clone(),
                Entry::Vacant(slot) => {
                    let Some(source) = materials.get(key.0) else {
                        debug!("material for mesh {entity} is not loaded; leaving it unstyled");
                        continue;
                    };
                    let restyled = styled_material(source, style.material());
                    slot.insert(materials.add(restyled)).clone()
                }
            };
            material.0 = handle;
        }
    }

    /// Plugin applying [`SurfaceStyle`]s to tagged scenes.
    #[derive(Debug, Default)]
    pub struct MaterialStylePlugin;

    impl Plugin for MaterialStylePlugin {
        fn build(&self, app: &mut App) {
            app.add_systems(Update, restyle_scene_materials_system);
        }
    }
}
