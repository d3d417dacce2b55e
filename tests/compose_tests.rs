//! Composition Tests
//!
//! Tests for:
//! - MixinRegistry: bootstrap, lookup, duplicate-name rejection
//! - CompositionContext: parameter-driven fragment selection, nested and
//!   array composition slots, macro injection
//! - Composition stack protocol: LIFO enforcement through the raw API
//! - Used-parameter tracking: reads mark used, raises adjust the
//!   recorded value, nested slots see only their own reads

use std::sync::LazyLock;

use weft::{
    CompositionContext, CompositionSlot, MixinRegistry, ParameterKey, ParameterSet,
    ShaderGeneratorSource, ShaderSource, WeftError,
};

// ============================================================================
// Parameter keys shared by the test builders
// ============================================================================

static HAS_SKINNING: LazyLock<ParameterKey<bool>> =
    LazyLock::new(|| ParameterKey::new("Geometry.HasSkinning", false));

static BONE_COUNT: LazyLock<ParameterKey<u32>> =
    LazyLock::new(|| ParameterKey::new("Geometry.BoneCount", 0));

static MAX_BONES: LazyLock<ParameterKey<u32>> =
    LazyLock::new(|| ParameterKey::new("Geometry.MaxBones", 32));

static HAS_NORMAL_MAP: LazyLock<ParameterKey<bool>> =
    LazyLock::new(|| ParameterKey::new("Material.HasNormalMap", false));

static LIGHT_GROUPS: LazyLock<ParameterKey<Vec<ShaderSource>>> =
    LazyLock::new(|| ParameterKey::new("Lighting.DirectGroups", Vec::new()));

/// A forward-shading effect in the shape real generators take: a short
/// declarative sequence of conditionals over parameter reads.
fn forward_effect(ctx: &mut CompositionContext<'_>) -> weft::Result<()> {
    ctx.mixin("TransformVS")?;

    if ctx.get_param(&HAS_SKINNING) {
        let bones = ctx.get_param(&BONE_COUNT);
        let max = ctx.raise_param(&MAX_BONES, bones);
        ctx.add_macro("MAX_BONES", &max.to_string());
        ctx.mixin("SkinningVS")?;
    }

    ctx.compose("surface", "Surface", |ctx| {
        if ctx.get_param(&HAS_NORMAL_MAP) {
            ctx.mixin("NormalMapSurface")
        } else {
            ctx.mixin("FlatSurface")
        }
    })?;

    for (index, group) in ctx.get_param(&LIGHT_GROUPS).iter().enumerate() {
        ctx.compose_source_in_array("lightGroups", &format!("LightGroup{index}"), group)?;
    }
    Ok(())
}

fn test_registry() -> MixinRegistry {
    let mut builder = MixinRegistry::builder();
    builder.register("ForwardEffect", forward_effect).unwrap();
    builder.build()
}

// ============================================================================
// Parameter-driven composition
// ============================================================================

#[test]
fn minimal_parameters_select_flat_surface() {
    let registry = test_registry();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    let names: Vec<_> = root.mixins().iter().map(|m| m.class_name_str()).collect();
    assert_eq!(names, vec!["TransformVS"]);

    let Some(CompositionSlot::Single(surface)) = root.composition("surface") else {
        panic!("expected single surface slot");
    };
    assert!(surface.has_mixin("FlatSurface"));
    assert!(!surface.has_mixin("NormalMapSurface"));
}

#[test]
fn skinning_raises_max_bones_and_injects_macro() {
    let registry = test_registry();
    let mut params = ParameterSet::new();
    params.set(&HAS_SKINNING, true);
    params.set(&BONE_COUNT, 72);

    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    assert!(root.has_mixin("SkinningVS"));
    assert_eq!(root.macros().get("MAX_BONES"), Some("72"));

    // The raise is observable downstream: the working set holds the
    // adjusted value, and the used snapshot records it.
    assert_eq!(params.peek(&MAX_BONES), Some(72));
    assert_eq!(root.used_parameters().peek(&MAX_BONES), Some(72));
}

#[test]
fn light_group_sources_expand_into_array_slot_in_order() {
    let registry = test_registry();
    let mut params = ParameterSet::new();
    params.set(
        &LIGHT_GROUPS,
        vec![
            ShaderSource::class("LightDirectionalGroup"),
            ShaderSource::class("LightPointGroup"),
        ],
    );

    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    let Some(CompositionSlot::Array(groups)) = root.composition("lightGroups") else {
        panic!("expected array slot");
    };
    assert_eq!(groups.len(), 2);
    assert!(groups[0].has_mixin("LightDirectionalGroup"));
    assert!(groups[1].has_mixin("LightPointGroup"));
}

#[test]
fn generator_source_parameters_override_callers() {
    let registry = test_registry();

    let mut generator_params = ParameterSet::new();
    generator_params.set(&HAS_NORMAL_MAP, true);
    let source = ShaderGeneratorSource::with_parameters("ForwardEffect", generator_params);

    let mut params = ParameterSet::new();
    params.set(&HAS_NORMAL_MAP, false);
    params.merge(source.parameters());

    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    let Some(CompositionSlot::Single(surface)) = root.composition("surface") else {
        panic!("expected single surface slot");
    };
    assert!(surface.has_mixin("NormalMapSurface"));
}

// ============================================================================
// Used-parameter tracking
// ============================================================================

#[test]
fn default_reads_are_marked_used() {
    let registry = test_registry();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    // Never set, but read on the decision path: present in the snapshot
    // with its default value.
    let used = root.used_parameters();
    assert_eq!(used.peek(&HAS_SKINNING), Some(false));
    assert_eq!(used.peek(&HAS_NORMAL_MAP), Some(false));

    // Never read at all: absent.
    assert!(used.peek(&BONE_COUNT).is_none());
}

#[test]
fn nested_slot_sees_only_its_own_reads() {
    let registry = test_registry();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "ForwardEffect");
    ctx.mixin("ForwardEffect").unwrap();
    let root = ctx.finish().unwrap();

    let Some(CompositionSlot::Single(surface)) = root.composition("surface") else {
        panic!("expected single surface slot");
    };
    assert!(surface.used_parameters().peek(&HAS_NORMAL_MAP).is_some());
    assert!(surface.used_parameters().peek(&HAS_SKINNING).is_none());
}

// ============================================================================
// Stack protocol through the raw context API
// ============================================================================

#[test]
fn raw_protocol_out_of_order_pop_is_rejected() {
    let registry = MixinRegistry::builder().build();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "Effect");

    ctx.push_composition("outer", false, "Outer");
    ctx.push_composition("inner", false, "Inner");

    let err = ctx.pop_composition("outer").unwrap_err();
    assert!(matches!(err, WeftError::MismatchedComposition { .. }));

    // The correct order still works.
    ctx.pop_composition("inner").unwrap();
    ctx.pop_composition("outer").unwrap();
    assert_eq!(ctx.open_slots(), 0);
}

#[test]
fn finishing_with_open_slot_is_a_builder_bug() {
    let registry = MixinRegistry::builder().build();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "Effect");

    ctx.push_composition("dangling", false, "Child");

    let err = ctx.finish().unwrap_err();
    assert!(matches!(
        err,
        WeftError::UnclosedComposition { open: 1, .. }
    ));
}

#[test]
fn double_push_same_array_slot_appends_not_dedupes() {
    let registry = MixinRegistry::builder().build();
    let mut params = ParameterSet::new();
    let mut ctx = CompositionContext::new(&registry, &mut params, "Effect");

    // The same fragment twice: order-preserving, not deduplicated.
    for _ in 0..2 {
        ctx.compose_in_array("stages", "Stage", |ctx| ctx.mixin("BlurStage"))
            .unwrap();
    }

    let root = ctx.finish().unwrap();
    let Some(CompositionSlot::Array(stages)) = root.composition("stages") else {
        panic!("expected array slot");
    };
    assert_eq!(stages.len(), 2);
    assert!(stages.iter().all(|s| s.has_mixin("BlurStage")));
}
