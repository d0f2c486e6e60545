use resoglyph::{
    GlyphEngine, GlyphParams, LayerKind, ManualScheduler, RecordingSurface, RenderSettings,
    RenderState, Signature, Viewport, compose_frame, map_attributes,
};

fn viewport() -> Viewport {
    Viewport::with_unit_scale(400.0, 400.0).unwrap()
}

fn engine() -> GlyphEngine<RecordingSurface, ManualScheduler> {
    GlyphEngine::attach(
        RecordingSurface::new(viewport()),
        ManualScheduler::new(),
        RenderSettings::default(),
    )
    .unwrap()
}

fn tick(engine: &mut GlyphEngine<RecordingSurface, ManualScheduler>) {
    engine.scheduler_mut().take_due().unwrap();
    engine.frame(0.02).unwrap();
}

fn xorshift64(state: &mut u64) -> u64 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    *state = x;
    x
}

fn unit(state: &mut u64) -> f64 {
    (xorshift64(state) >> 11) as f64 / (1u64 << 53) as f64
}

#[test]
fn engine_frames_match_direct_composition() {
    let sig = Signature::new(
        0.62,
        0.81,
        0.55,
        GlyphParams {
            shape_complexity: 0.7,
            color_hue: 0.58,
            animation_speed: 0.45,
            resonance_frequency: 4.5,
        },
    );

    let mut engine = engine();
    engine.update_signature(Some(sig));
    for _ in 0..5 {
        tick(&mut engine);
    }

    // Accumulate time exactly the way the engine clock does.
    let mut t = 0.0;
    for frame in engine.surface().frames() {
        t += 0.02;
        let direct = compose_frame(
            &RenderState::Active(sig),
            t,
            &RenderSettings::default(),
            viewport(),
        );
        assert_eq!(format!("{frame:?}"), format!("{direct:?}"));
    }
}

#[test]
fn no_signature_and_no_processing_paints_idle() {
    let mut engine = engine();
    tick(&mut engine);

    let list = engine.surface().last_frame().unwrap();
    assert_eq!(list.kinds(), vec![LayerKind::Idle]);
    assert_eq!(list.op_count(), 2);
}

#[test]
fn out_of_range_signature_clamps_end_to_end() {
    let wild = Signature {
        emotional_valence: 5.0,
        cognitive_complexity: -3.0,
        energy_level: f64::NAN,
        glyph: GlyphParams {
            shape_complexity: 9.0,
            color_hue: -0.25,
            animation_speed: 7.7,
            resonance_frequency: 99.0,
        },
    };

    let mut engine = engine();
    engine.update_signature(Some(wild));
    tick(&mut engine);

    let direct = compose_frame(
        &RenderState::Active(wild.clamped()),
        0.02,
        &RenderSettings::default(),
        viewport(),
    );
    let painted = engine.surface().last_frame().unwrap();
    assert_eq!(format!("{painted:?}"), format!("{direct:?}"));
}

#[test]
fn random_signatures_compose_deterministic_bounded_frames() {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    let settings = RenderSettings::default();
    let vp = viewport();

    for _ in 0..50 {
        let sig = Signature::new(
            unit(&mut state) * 2.0 - 1.0,
            unit(&mut state),
            unit(&mut state),
            GlyphParams {
                shape_complexity: unit(&mut state),
                color_hue: unit(&mut state),
                animation_speed: unit(&mut state),
                resonance_frequency: 1.0 + unit(&mut state) * 9.0,
            },
        );
        let t = unit(&mut state) * 120.0;

        let attrs = map_attributes(&sig, t, &settings, vp);
        assert_eq!(attrs, map_attributes(&sig, t, &settings, vp));

        assert!(attrs.vertex_count >= 3);
        assert_eq!(attrs.vertices.len(), attrs.vertex_count + 1);
        assert!(attrs.vertices.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert!((0.0..=360.0).contains(&attrs.hue));
        assert!((0.0..=100.0).contains(&attrs.saturation));
        assert!((0.0..=100.0).contains(&attrs.lightness));
        assert!(attrs.stroke_width > 0.0);
        assert!(attrs.base_radius > 0.0);

        let a = compose_frame(&RenderState::Active(sig), t, &settings, vp);
        let b = compose_frame(&RenderState::Active(sig), t, &settings, vp);
        assert_eq!(format!("{a:?}"), format!("{b:?}"));
    }
}
