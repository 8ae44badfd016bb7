use fpl_terminal::fetch::{Resource, ResourceView};

#[test]
fn starts_idle() {
    let resource: Resource<u32> = Resource::new();
    assert_eq!(resource.view(), ResourceView::Idle);
    assert_eq!(resource.generation(), 0);
}

#[test]
fn latest_request_wins() {
    let mut resource = Resource::new();
    let first = resource.begin();
    let second = resource.begin();
    assert_eq!(resource.view(), ResourceView::Loading);

    assert!(!resource.settle(first, Ok(1)));
    assert!(resource.is_loading());
    assert!(resource.settle(second, Ok(2)));
    assert_eq!(resource.view(), ResourceView::Ready(&2));

    // A late duplicate for a settled generation is ignored too.
    assert!(!resource.settle(second, Ok(3)));
    assert_eq!(resource.data(), Some(&2));
}

#[test]
fn failure_clears_data_and_keeps_message() {
    let mut resource = Resource::new();
    let generation = resource.begin();
    resource.settle(generation, Ok("old".to_string()));

    let generation = resource.begin();
    assert!(resource.settle(generation, Err("Team not found".to_string())));
    assert_eq!(resource.view(), ResourceView::Failed("Team not found"));
    assert!(resource.data().is_none());

    let generation = resource.begin();
    assert!(resource.error().is_none());
    resource.settle(generation, Err("  ".to_string()));
    assert_eq!(resource.error(), Some("request failed"));
}

#[test]
fn reset_invalidates_in_flight_request() {
    let mut resource = Resource::new();
    let generation = resource.begin();
    resource.reset();
    assert!(!resource.settle(generation, Ok(5)));
    assert_eq!(resource.view(), ResourceView::Idle);
}
