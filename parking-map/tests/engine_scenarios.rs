mod support;

use std::time::Duration;

use parking_map::map::detail::SegmentClick;
use parking_map::map::engine::UNAVAILABLE_MESSAGE;
use parking_map::map::headless::HeadlessSurface;
use parking_map::map::layers::{
    GARAGE_LAYER, METER_LAYER, POI_SOURCE, SEGMENT_LAYER, SEGMENT_SOURCE,
};
use parking_map::map::readiness::SurfaceState;
use parking_map::{EngineClosed, EngineEvent, SyncStatus};
use pretty_assertions::assert_eq;
use shared_types::{NearbyResponse, ViewportCenter};
use support::*;

#[tokio::test(start_paused = true)]
async fn settle_fetch_then_filter_toggle_without_refetch() {
    let source = CannedSource::replying(response("downtown", "free"));
    let mut engine =
        engine(HeadlessSurface::new(), &source).with_filters(filters(&["garage", "free"]));
    let handle = engine.handle();

    engine.start();
    handle.style_loaded().unwrap();
    settle(&mut engine).await;

    handle.move_end(SAN_JOSE).unwrap();
    settle(&mut engine).await;

    let queries = source.queries();
    assert_eq!(queries.len(), 2);
    let last = queries.last().unwrap();
    assert_eq!(last.center, SAN_JOSE);
    assert_eq!(last.radius_meters, 800);
    assert_eq!(last.filters.to_query_value(), "garage,free");

    let surface = engine.surface();
    assert_eq!(surface.visible_features(GARAGE_LAYER).len(), 1);
    assert_eq!(surface.visible_features(METER_LAYER).len(), 1);
    assert_eq!(surface.visible_features(SEGMENT_LAYER).len(), 1);

    handle.set_filters(filters(&["garage"])).unwrap();
    assert!(engine.step().await);

    let surface = engine.surface();
    assert_eq!(surface.visible_features(GARAGE_LAYER).len(), 1);
    assert!(surface.visible_features(SEGMENT_LAYER).is_empty());
    assert_eq!(source.queries().len(), 2);
    assert_eq!(
        engine.status(),
        &SyncStatus::Ready {
            pois: 2,
            segments: 1
        }
    );
}

#[tokio::test(start_paused = true)]
async fn burst_of_moves_issues_a_single_fetch_for_the_last_center() {
    let source = CannedSource::replying(response("any", "2h"));
    let mut engine = engine(HeadlessSurface::new(), &source);
    engine.start();
    engine.dispatch(EngineEvent::StyleLoaded);
    settle(&mut engine).await;
    assert_eq!(source.queries().len(), 1);

    for i in 0..6 {
        engine.dispatch(EngineEvent::MoveEnd(ViewportCenter::new(
            -121.89 + i as f64 * 0.001,
            37.33,
        )));
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    settle(&mut engine).await;

    let queries = source.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].center, ViewportCenter::new(-121.89 + 0.005, 37.33));
    assert_eq!(engine.current_center(), Some(queries[1].center));
}

#[tokio::test(start_paused = true)]
async fn data_arriving_before_layers_is_applied_once_when_ready() {
    let source = CannedSource::default();
    source.push(Reply::Ok(response("early", "permit"), Duration::ZERO));
    source.push(Reply::Ok(response("initial", "permit"), Duration::from_secs(5)));
    let mut engine = engine(HeadlessSurface::deferred_style(), &source);
    let handle = engine.handle();
    engine.start();
    assert_eq!(engine.surface_state(), SurfaceState::Loading);

    handle.move_end(SAN_JOSE).unwrap();
    settle(&mut engine).await;
    assert_eq!(engine.surface_state(), SurfaceState::Loading);
    assert_eq!(engine.surface().source_writes(), 0);
    assert!(matches!(engine.status(), SyncStatus::Ready { .. }));

    // Idle before the style is in does nothing.
    handle.idle().unwrap();
    assert!(engine.step().await);
    assert_eq!(engine.surface().source_writes(), 0);

    engine.surface_mut().finish_style_load();
    handle.idle().unwrap();
    assert!(engine.step().await);
    assert_eq!(engine.surface_state(), SurfaceState::LayersReady);
    assert_eq!(engine.surface().source_writes(), 2);
    assert_eq!(names(engine.surface(), SEGMENT_SOURCE), vec!["early"]);

    for _ in 0..3 {
        handle.idle().unwrap();
        assert!(engine.step().await);
    }
    assert_eq!(engine.surface().source_writes(), 2);

    // The first usable style also triggers the initial-viewport load.
    settle(&mut engine).await;
    assert_eq!(engine.surface().source_writes(), 4);
    assert_eq!(names(engine.surface(), SEGMENT_SOURCE), vec!["initial"]);
    assert_eq!(source.queries().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn moving_before_the_style_loads_fetches_the_moved_to_center() {
    let san_francisco = ViewportCenter::new(-122.4194, 37.7749);
    let source = CannedSource::default();
    source.push(Reply::Ok(response("moved", "free"), Duration::ZERO));
    source.push(Reply::Ok(response("moved-again", "free"), Duration::ZERO));
    let mut engine = engine(HeadlessSurface::deferred_style(), &source);
    let handle = engine.handle();
    engine.start();

    handle.move_end(san_francisco).unwrap();
    settle(&mut engine).await;

    engine.surface_mut().finish_style_load();
    handle.style_loaded().unwrap();
    settle(&mut engine).await;

    let centers: Vec<_> = source.queries().iter().map(|q| q.center).collect();
    assert_eq!(centers, vec![san_francisco, san_francisco]);
    assert_eq!(engine.current_center(), Some(san_francisco));
    assert_eq!(names(engine.surface(), SEGMENT_SOURCE), vec!["moved-again"]);
}

#[tokio::test(start_paused = true)]
async fn slow_older_response_never_overwrites_newer_pair() {
    let source = CannedSource::replying(NearbyResponse::default());
    let mut engine = engine(HeadlessSurface::new(), &source);
    engine.start();
    engine.dispatch(EngineEvent::StyleLoaded);
    settle(&mut engine).await;
    let writes_before = engine.surface().source_writes();

    source.push(Reply::Ok(response("old", "free"), Duration::from_secs(2)));
    source.push(Reply::Ok(response("new", "free"), Duration::from_millis(10)));

    engine.dispatch(EngineEvent::MoveEnd(ViewportCenter::new(-121.90, 37.33)));
    assert!(engine.step().await); // settle -> old fetch
    engine.dispatch(EngineEvent::MoveEnd(ViewportCenter::new(-121.88, 37.34)));
    assert!(engine.step().await); // settle -> new fetch
    assert_eq!(source.queries().len(), 3);

    settle(&mut engine).await;

    let surface = engine.surface();
    assert_eq!(names(surface, POI_SOURCE), vec!["new", "new"]);
    assert_eq!(names(surface, SEGMENT_SOURCE), vec!["new"]);
    assert_eq!(surface.source_writes(), writes_before + 2);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_old_data_and_next_settle_retries() {
    let source = CannedSource::replying(response("first", "free"));
    let mut engine = engine(HeadlessSurface::new(), &source);
    let handle = engine.handle();
    engine.start();
    handle.style_loaded().unwrap();
    settle(&mut engine).await;

    source.push(Reply::Fail(Duration::from_millis(50)));
    handle.move_end(SAN_JOSE).unwrap();
    settle(&mut engine).await;

    assert!(matches!(engine.status(), SyncStatus::Unavailable { .. }));
    assert_eq!(engine.surface().messages(), [UNAVAILABLE_MESSAGE]);
    assert_eq!(names(engine.surface(), SEGMENT_SOURCE), vec!["first"]);

    source.push(Reply::Ok(response("retry", "free"), Duration::ZERO));
    handle.move_end(SAN_JOSE).unwrap();
    settle(&mut engine).await;

    assert!(matches!(engine.status(), SyncStatus::Ready { .. }));
    assert_eq!(names(engine.surface(), SEGMENT_SOURCE), vec!["retry"]);
}

#[tokio::test(start_paused = true)]
async fn segment_click_opens_detail_with_reminder() {
    let source = CannedSource::replying(response("S 4th St", "2h"));
    let mut engine = engine(HeadlessSurface::new(), &source);
    let handle = engine.handle();
    engine.start();
    handle.style_loaded().unwrap();
    settle(&mut engine).await;

    let properties = engine.surface().visible_features(SEGMENT_LAYER)[0]
        .properties
        .clone();
    handle
        .segment_clicked(SegmentClick {
            anchor: SAN_JOSE,
            features: vec![properties],
        })
        .unwrap();
    handle
        .segment_clicked(SegmentClick {
            anchor: SAN_JOSE,
            features: vec![],
        })
        .unwrap();
    assert!(engine.step().await);
    assert!(engine.step().await);

    let popup = engine.surface_mut().popup_mut().unwrap();
    assert_eq!(popup.detail.title(), "S 4th St");
    assert_eq!(popup.detail.lines()[0], "Rule: 2h (120 min)");
    assert_eq!(popup.reminder.minutes(), Some(120));

    popup.reminder.start().unwrap();
    assert!(popup.reminder.is_active());
}

#[tokio::test(start_paused = true)]
async fn locate_pans_and_fetches_at_the_result() {
    let source = CannedSource::replying(response("sjsu", "permit"));
    let mut engine = engine(HeadlessSurface::new(), &source);
    let handle = engine.handle();
    engine.start();
    handle.style_loaded().unwrap();
    settle(&mut engine).await;

    let sjsu = ViewportCenter::new(-121.8811, 37.3352);
    let found = handle
        .locate(&FixedGeocoder(Some(sjsu)), "San Jose State")
        .await
        .unwrap();
    assert_eq!(found, sjsu);
    settle(&mut engine).await;

    assert_eq!(engine.surface().camera(), Some((sjsu, 15.0)));
    assert_eq!(source.queries().last().unwrap().center, sjsu);

    let err = handle
        .locate(&FixedGeocoder(None), "nowhere")
        .await
        .unwrap_err();
    assert_eq!(err.user_message(), "No result");
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_the_loop_and_closes_the_handle() {
    let source = CannedSource::default();
    let mut engine = engine(HeadlessSurface::new(), &source);
    let handle = engine.handle();
    engine.start();

    handle.move_end(SAN_JOSE).unwrap();
    handle.shutdown().unwrap();
    assert!(engine.step().await);
    assert!(!engine.step().await);
    drop(engine);

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(source.queries().is_empty());
    assert_eq!(handle.move_end(SAN_JOSE), Err(EngineClosed));
}
