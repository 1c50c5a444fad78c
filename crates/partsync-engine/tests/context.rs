mod common;

use common::*;
use expect_test::expect;
use partsync_model::outline::render_outline;
use partsync_model::DefaultNamingStrategy;
use serde_json::json;

#[tokio::test]
async fn load_without_design_key_is_a_configuration_error() {
    let ctx = SyncContext::new(
        SyncConfig::default(),
        ReplayTransport::new(&recording(json!([]))),
    );

    let err = ctx.load_model().await.unwrap_err();
    assert!(matches!(err, SyncError::Configuration(_)));
    assert!(ctx.snapshot().is_empty());
    assert!(!ctx.is_model_loaded());
    assert_eq!(ctx.last_error(), Some(err));
    assert!(ctx.viewer().calls().is_empty());
}

#[tokio::test]
async fn load_runs_handshake_then_fetches_model() {
    let ctx = context(json!([]));
    let tree = ctx.load_model().await.unwrap();

    assert!(ctx.is_model_loaded());
    assert!(!ctx.is_dirty());
    assert_eq!(tree.len(), 5);
    let calls = ctx.viewer().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], ViewerCall::CheckCompatibility);
    let ViewerCall::Initialize(options) = &calls[1] else {
        panic!("expected initialize, got {:?}", calls[1]);
    };
    assert_eq!(options.design, DESIGN_KEY);
    assert_eq!(options.container, "partsync-viewer");
    assert!(!options.panes);
    assert!(options.verbose);
    assert!(options.open_from_file.is_none());
    assert_eq!(calls[2], ViewerCall::GetPropertyValues);

    expect![[r#"
        Root "Bike" [Assembly]
          Length = 1.5 (number)
          Frame Size = 54 (number)
          ! info: m0
          * Export
          Root.Frame "Frame" [Frame]
            Material = "Steel" (string)
          Root.Wheels "WheelCollection" [Collection]
            Root.Wheels.Front "Front" [Wheel]
              Size = "29in" (string)
            Root.Wheels.Rear "Rear" [Wheel]
              Size = "27in" (string)
    "#]]
    .assert_eq(&render_outline(&tree));
}

#[tokio::test]
async fn load_from_file_hands_model_to_viewer() {
    let ctx = context(json!([]));
    ctx.load_model_from_file(b"solid bike".to_vec())
        .await
        .unwrap();

    let calls = ctx.viewer().calls();
    let ViewerCall::Initialize(options) = &calls[1] else {
        panic!("expected initialize, got {:?}", calls[1]);
    };
    assert_eq!(options.open_from_file.as_deref(), Some(&b"solid bike"[..]));
}

#[tokio::test]
async fn incompatible_viewer_aborts_the_load() {
    let recording = Recording::from_value(json!({
        "compatibility": {"compatible": false, "reason": "WebGL unavailable"},
        "initial": bike_model()
    }))
    .unwrap();
    let ctx = SyncContext::new(config(), ReplayTransport::new(&recording));

    let err = ctx.load_model().await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Transport(TransportError::new("WebGL unavailable"))
    );
    assert_eq!(ctx.last_error(), Some(err));
    assert!(!ctx.is_model_loaded());
    assert_eq!(ctx.viewer().calls(), [ViewerCall::CheckCompatibility]);
}

#[tokio::test]
async fn late_subscribers_see_the_latest_tree() {
    let ctx = context(json!([]));
    let early = ctx.subscribe_model();
    assert!(early.borrow().is_none());

    ctx.load_model().await.unwrap();

    let late = ctx.subscribe_model();
    let tree = late.borrow().clone().expect("tree published");
    assert_eq!(tree.root().map(|root| root.name()), Some("Bike"));
    assert!(early.has_changed().unwrap());
}

#[tokio::test]
async fn end_session_clears_and_unloads() {
    let ctx = loaded(json!([])).await;
    let model = ctx.subscribe_model();

    ctx.end_session();

    assert!(!ctx.is_model_loaded());
    assert!(!ctx.is_dirty());
    assert!(ctx.parts().is_empty());
    assert!(model.borrow().is_none());
    assert_eq!(ctx.viewer().calls().last(), Some(&ViewerCall::Unload));

    // a second end unloads nothing
    ctx.end_session();
    let unloads = ctx
        .viewer()
        .calls()
        .into_iter()
        .filter(|call| *call == ViewerCall::Unload)
        .count();
    assert_eq!(unloads, 1);
}

#[tokio::test]
async fn reload_unloads_previous_viewer() {
    let ctx = loaded(json!([])).await;
    ctx.load_model().await.unwrap();

    let calls = ctx.viewer().calls();
    assert_eq!(calls[3], ViewerCall::Unload);
    assert_eq!(calls[4], ViewerCall::CheckCompatibility);
    assert_eq!(ctx.parts().len(), 5);
}

#[tokio::test]
async fn lookups_resolve_parts() {
    let ctx = loaded(json!([])).await;

    assert_eq!(ctx.root().unwrap().ref_chain(), &RefChain::root());
    assert_eq!(ctx.part("Root.Frame").unwrap().name(), "Frame");
    assert!(ctx.part("Root.Seat").is_none());

    let rear = ctx
        .find_part_by_property("Wheel", "Size", &PropertyValue::from("27in"))
        .unwrap();
    assert_eq!(rear.ref_chain(), &RefChain::new("Root.Wheels.Rear"));
    assert!(ctx
        .find_part_by_property("Frame", "Size", &PropertyValue::from("27in"))
        .is_none());
    assert_eq!(
        ctx.shortcut_value("Root", "FrameSize").unwrap(),
        Some(PropertyValue::Number(54.0))
    );

    let snapshot = ctx.snapshot();
    let wheels = snapshot.collection("Root", "Wheels").unwrap();
    assert_eq!(wheels.len(), 2);
}

#[tokio::test]
async fn property_lookup_matches_integers_against_numbers() {
    let ctx = loaded(json!([])).await;

    let bike = ctx
        .find_part_by_property("Assembly", "FrameSize", &PropertyValue::Integer(54))
        .unwrap();
    assert_eq!(bike.ref_chain(), &RefChain::root());
    assert!(ctx
        .find_part_by_property("Assembly", "FrameSize", &PropertyValue::from(54.0))
        .is_some());
    assert!(ctx
        .find_part_by_property("Assembly", "FrameSize", &PropertyValue::Integer(56))
        .is_none());
    assert!(ctx
        .find_part_by_property("Assembly", "FrameSize", &PropertyValue::from("54"))
        .is_none());
}

#[tokio::test]
async fn concurrent_merges_publish_the_latest_tree() {
    let ctx = loaded(json!([])).await;
    let model = ctx.subscribe_model();

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let ctx = &ctx;
            scope.spawn(move || {
                for round in 0..50 {
                    let length = f64::from(worker * 100 + round);
                    ctx.apply_model_data(length_changed(length)).unwrap();
                }
            });
        }
    });

    let published = model.borrow().clone().unwrap();
    assert!(std::sync::Arc::ptr_eq(&published, &ctx.snapshot()));
    assert_eq!(ctx.parts().len(), 5);
}

#[tokio::test]
async fn naming_strategy_change_reprojects_current_tree() {
    let ctx = loaded(json!([])).await;
    let model = ctx.subscribe_model();
    assert!(ctx.shortcut_value("Root", "FrameSize").is_ok());

    ctx.set_naming_strategy(DefaultNamingStrategy::with_replacement("_"));

    assert_eq!(
        ctx.shortcut_value("Root", "FrameSize"),
        Err(SyncError::UnknownShortcut {
            ref_chain: "Root".into(),
            name: "FrameSize".into(),
        })
    );
    assert_eq!(
        ctx.shortcut_value("Root", "Frame_Size").unwrap(),
        Some(PropertyValue::Number(54.0))
    );
    let published = model.borrow().clone().unwrap();
    assert!(published.shortcut_property("Root", "Frame_Size").is_some());
}

#[tokio::test]
async fn malformed_model_data_leaves_tree_untouched() {
    let ctx = loaded(json!([])).await;
    let before = ctx.snapshot();

    let err = ctx.apply_model_data(json!({"Name": "no ref chain"})).unwrap_err();

    assert!(matches!(err, SyncError::MalformedDelta(_)));
    assert_eq!(*ctx.snapshot(), *before);
    assert_eq!(ctx.last_error(), Some(err));
}

#[tokio::test]
async fn pushed_model_data_is_merged_without_dirtying() {
    let ctx = loaded(json!([])).await;

    let report = ctx
        .apply_model_data(json!({
            "refChain": "Root",
            "Name": "Bike",
            "PartType": "Assembly",
            "removedRefChains": ["Root.Wheels"]
        }))
        .unwrap();

    assert_eq!(report.removed.len(), 3);
    assert!(!ctx.is_dirty());
    assert_eq!(ctx.parts().len(), 2);
    assert!(ctx.snapshot().collection("Root", "Wheels").is_none());
}

#[test]
fn design_key_can_be_set_at_runtime() {
    let ctx = SyncContext::new(
        SyncConfig::default(),
        ReplayTransport::new(&recording(json!([]))),
    );
    assert!(ctx.design_key().is_none());
    ctx.set_design_key(" abc ");
    assert_eq!(ctx.design_key().as_deref(), Some("abc"));
    ctx.set_design_key("   ");
    assert!(ctx.design_key().is_none());
}
