#[test]
#[cfg(feature = "integration-tests")]
fn should_draw_a_bounded_number_of_frames_and_exit() {
    use shape_garden::{AppConfig, SceneConfig, run};

    let config = AppConfig {
        scene: SceneConfig {
            seed: Some(7),
            ..Default::default()
        },
        frame_limit: Some(5),
        ..Default::default()
    };
    run(config).unwrap();
}
