//! PBR material model.
//!
//! A material is five texture channels plus alpha handling. Each channel
//! pairs an optional GPU texture handle (leased from the owning scene's
//! texture map, never deleted through the material) with the scalar factors
//! that modulate it. Channels without a source texture keep `texture: None`
//! and carry the material's constant factors, so a renderer can treat all
//! five channels uniformly.

/// How the base-color alpha channel is interpreted.
///
/// `None` is the state of a material the importer never touched; assets only
/// ever produce one of the three glTF modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AlphaMode {
    #[default]
    None,
    Opaque,
    Mask,
    Blend,
}

/// Per-channel scalar payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChannelFactors {
    BaseColor([f32; 4]),
    MetallicRoughness { metallic: f32, roughness: f32 },
    Normal { scale: f32 },
    Occlusion { strength: f32 },
    Emissive([f32; 3]),
}

/// One texture channel of a material: the (optional) sampled texture and its
/// factors.
#[derive(Clone, Copy, Debug)]
pub struct MaterialChannel {
    pub texture: Option<glow::Texture>,
    pub factors: ChannelFactors,
}

impl MaterialChannel {
    pub fn new(texture: Option<glow::Texture>, factors: ChannelFactors) -> Self {
        Self { texture, factors }
    }
}

/// A physically based material with base color, metallic-roughness, normal,
/// occlusion and emissive channels.
#[derive(Clone, Debug)]
pub struct PbrMaterial {
    pub name: String,
    pub base_color: MaterialChannel,
    pub metallic_roughness: MaterialChannel,
    pub normal: MaterialChannel,
    pub occlusion: MaterialChannel,
    pub emissive: MaterialChannel,
    pub alpha_mode: AlphaMode,
    pub alpha_cutoff: f32,
    pub double_sided: bool,
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self {
            name: String::new(),
            base_color: MaterialChannel::new(None, ChannelFactors::BaseColor([1.0; 4])),
            metallic_roughness: MaterialChannel::new(
                None,
                ChannelFactors::MetallicRoughness {
                    metallic: 1.0,
                    roughness: 1.0,
                },
            ),
            normal: MaterialChannel::new(None, ChannelFactors::Normal { scale: 1.0 }),
            occlusion: MaterialChannel::new(None, ChannelFactors::Occlusion { strength: 1.0 }),
            emissive: MaterialChannel::new(None, ChannelFactors::Emissive([0.0; 3])),
            alpha_mode: AlphaMode::None,
            alpha_cutoff: 0.5,
            double_sided: false,
        }
    }
}

impl PbrMaterial {
    pub fn base_color_factor(&self) -> [f32; 4] {
        match self.base_color.factors {
            ChannelFactors::BaseColor(c) => c,
            _ => [1.0; 4],
        }
    }

    pub fn metallic_roughness_factors(&self) -> (f32, f32) {
        match self.metallic_roughness.factors {
            ChannelFactors::MetallicRoughness {
                metallic,
                roughness,
            } => (metallic, roughness),
            _ => (1.0, 1.0),
        }
    }

    pub fn normal_scale(&self) -> f32 {
        match self.normal.factors {
            ChannelFactors::Normal { scale } => scale,
            _ => 1.0,
        }
    }

    pub fn occlusion_strength(&self) -> f32 {
        match self.occlusion.factors {
            ChannelFactors::Occlusion { strength } => strength,
            _ => 1.0,
        }
    }

    pub fn emissive_factor(&self) -> [f32; 3] {
        match self.emissive.factors {
            ChannelFactors::Emissive(c) => c,
            _ => [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_material_has_empty_channels_and_no_alpha_mode() {
        let material = PbrMaterial::default();
        assert_eq!(material.alpha_mode, AlphaMode::None);
        assert!(material.base_color.texture.is_none());
        assert!(material.metallic_roughness.texture.is_none());
        assert!(material.normal.texture.is_none());
        assert!(material.occlusion.texture.is_none());
        assert!(material.emissive.texture.is_none());
        assert_eq!(material.base_color_factor(), [1.0; 4]);
        assert_eq!(material.metallic_roughness_factors(), (1.0, 1.0));
        assert_eq!(material.emissive_factor(), [0.0; 3]);
    }

    #[test]
    fn channel_factor_accessors_read_the_tagged_payload() {
        let mut material = PbrMaterial::default();
        material.base_color.factors = ChannelFactors::BaseColor([0.5, 0.25, 1.0, 0.75]);
        material.normal.factors = ChannelFactors::Normal { scale: 2.0 };
        material.occlusion.factors = ChannelFactors::Occlusion { strength: 0.3 };
        assert_eq!(material.base_color_factor(), [0.5, 0.25, 1.0, 0.75]);
        assert_eq!(material.normal_scale(), 2.0);
        assert_eq!(material.occlusion_strength(), 0.3);
    }
}
