use super::*;

fn navigator(base: &str) -> LoggingNavigator {
    LoggingNavigator::new(Url::parse(base).expect("ui base"))
}

#[test]
fn site_relative_targets_stay_below_the_base_path() {
    let nav = navigator("https://host.example/inveniordm/");

    assert_eq!(
        nav.resolve(Destination::UPLOADS),
        "https://host.example/inveniordm/me/uploads"
    );
    assert_eq!(
        nav.resolve(&Destination::preview(&RecordId::new("abcd-1234"))),
        "https://host.example/inveniordm/records/abcd-1234?preview=1"
    );
}

#[test]
fn base_without_trailing_slash_is_treated_as_a_directory() {
    let nav = navigator("https://host.example/inveniordm");

    assert_eq!(
        nav.resolve(&Destination::request(&RequestId::new("req-42"))),
        "https://host.example/inveniordm/me/requests/req-42"
    );
}

#[test]
fn absolute_links_pass_through() {
    let nav = navigator("https://host.example/inveniordm/");

    assert_eq!(
        nav.resolve("https://data.example.org/uploads/abcd-1234"),
        "https://data.example.org/uploads/abcd-1234"
    );
}

#[test]
fn history_records_replace_and_navigate_in_order() {
    let nav = navigator("https://host.example/");

    nav.replace("https://host.example/uploads/abcd-1234");
    nav.navigate(Destination::UPLOADS);

    assert_eq!(
        nav.history(),
        vec![
            Location::Replaced("https://host.example/uploads/abcd-1234".to_string()),
            Location::Navigated("https://host.example/me/uploads".to_string()),
        ]
    );
    assert_eq!(
        nav.last(),
        Some(Location::Navigated("https://host.example/me/uploads".to_string()))
    );
}
