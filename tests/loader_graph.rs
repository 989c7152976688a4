mod common;

use std::fs;

use shadowtext::adventure::{AdventureError, Direction, EntryPath, ItemCatalog, Sense};

#[test]
fn loads_entry_chain_and_reachable_rooms() {
    let tmp = common::writable_fixture();
    let loader = common::manor_loader(&tmp);
    let story = loader.load_story().unwrap();
    assert_eq!(story.default_world_id, "w1");

    let world = loader.load_world(&story.default_world_id, None).unwrap();
    let region = world.entry_region().unwrap();
    assert_eq!(region.id, "r1");
    let zone = region.entry_zone().unwrap();
    assert_eq!(zone.id, "z1");
    let entry = zone.entry().unwrap();
    assert_eq!(world.room(entry).id, "hall");

    // room7 is not reachable from the hall, so it is never loaded.
    assert_eq!(zone.room_count(), 4);
    assert_eq!(world.room_count(), 4);
    assert!(zone.room("room7").is_none());
}

#[test]
fn cycles_resolve_to_one_room_per_id() {
    let tmp = common::writable_fixture();
    let loader = common::manor_loader(&tmp);
    let world = loader.load_world("w1", None).unwrap();
    let zone = world.entry_region().unwrap().entry_zone().unwrap();

    let hall = zone.room("hall").unwrap();
    let library = world.room(hall).neighbor(Direction::North).unwrap();
    assert_eq!(Some(library), zone.room("library"));
    assert_eq!(world.room(library).neighbor(Direction::South), Some(hall));

    let study = world.room(library).neighbor(Direction::East).unwrap();
    assert_eq!(world.room(study).neighbor(Direction::South), Some(hall));
    assert_eq!(world.room(study).neighbor(Direction::West), Some(library));
}

#[test]
fn adjacency_stays_one_way() {
    let tmp = common::writable_fixture();
    let world = common::manor_loader(&tmp).load_world("w1", None).unwrap();
    let zone = world.entry_region().unwrap().entry_zone().unwrap();
    let hall = world.room(zone.room("hall").unwrap());
    let garden = world.room(zone.room("garden").unwrap());

    // study -> hall exists, hall -> study does not
    assert!(!hall.has_neighbor(Direction::South));
    // an exit entry with only flavor text is not an edge
    assert!(!garden.has_neighbor(Direction::NorthEast));
    assert_eq!(hall.exit_text(Direction::North), Some("An oak door stands ajar."));
    assert_eq!(hall.exit_text(Direction::East), None);
}

#[test]
fn room_items_skip_non_carriable_entries() {
    let tmp = common::writable_fixture();
    let world = common::manor_loader(&tmp).load_world("w1", None).unwrap();
    let zone = world.entry_region().unwrap().entry_zone().unwrap();
    let hall = world.room(zone.room("hall").unwrap());

    assert_eq!(hall.inventory.quantity_of("coin"), 3);
    assert_eq!(hall.inventory.quantity_of("lantern"), 1);
    assert!(!hall.inventory.contains_item("statue"));
    assert_eq!(hall.sense(Sense::Smell), Some("Old ashes and damp wool."));
    assert_eq!(hall.sense(Sense::Taste), None);
}

#[test]
fn saved_path_overrides_entry_points() {
    let tmp = common::writable_fixture();
    let loader = common::manor_loader(&tmp);
    let path = EntryPath::parse("w1.r1.z1.room7").unwrap();
    let world = loader.load_world(path.world(), Some(&path)).unwrap();
    let zone = world.entry_region().unwrap().entry_zone().unwrap();

    let entry = zone.entry().unwrap();
    assert_eq!(world.room(entry).id, "room7");
    assert_eq!(world.position_of(entry).to_string(), "w1.r1.z1.room7");
    assert_eq!(zone.room_count(), 5);
    assert_eq!(world.room(entry).neighbor(Direction::West), zone.room("hall"));
}

#[test]
fn missing_neighbor_file_is_not_found() {
    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    let library = common::room_file(&story, "library");
    let text = fs::read_to_string(&library).unwrap().replace("\"study\"", "\"vault\"");
    fs::write(&library, text).unwrap();

    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(matches!(err, AdventureError::NotFound(ref what) if what.contains("vault")), "{:?}", err);
}

#[test]
fn declared_id_must_match_file_name() {
    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    let garden = common::room_file(&story, "garden");
    let text = fs::read_to_string(&garden)
        .unwrap()
        .replace("\"id\": \"garden\"", "\"id\": \"orchard\"");
    fs::write(&garden, text).unwrap();

    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(matches!(err, AdventureError::MalformedDescription { .. }), "{:?}", err);
}

#[test]
fn broken_descriptions_are_malformed() {
    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    fs::write(common::room_file(&story, "study"), "{ \"id\": \"study\", ").unwrap();
    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(matches!(err, AdventureError::MalformedDescription { ref path, .. } if path.ends_with("study.json")));

    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    let hall = common::room_file(&story, "hall");
    let text = fs::read_to_string(&hall).unwrap().replace("\"listen\"", "\"sixth\"");
    fs::write(&hall, text).unwrap();
    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(matches!(err, AdventureError::MalformedDescription { .. }));

    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    let hall = common::room_file(&story, "hall");
    let text = fs::read_to_string(&hall).unwrap().replace("\"north\":", "\"upward\":");
    fs::write(&hall, text).unwrap();
    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(matches!(err, AdventureError::MalformedDescription { ref reason, .. } if reason.contains("upward")));
}

#[test]
fn unknown_world_and_bad_ids_are_rejected() {
    let tmp = common::writable_fixture();
    let loader = common::manor_loader(&tmp);
    assert!(matches!(loader.load_world("w9", None), Err(AdventureError::NotFound(_))));
    assert!(matches!(
        loader.load_world("../manor", None),
        Err(AdventureError::InvalidIdentifier(_))
    ));
}

#[test]
fn catalog_answers_existence_and_caches_items() {
    let tmp = common::writable_fixture();
    let loader = common::manor_loader(&tmp);
    assert!(loader.item_exists("coin"));
    assert!(loader.item_exists("statue"));
    assert!(!loader.item_exists("unicorn"));
    assert!(!loader.item_exists("../story"));

    let lantern = loader.load_item("lantern").unwrap();
    assert_eq!(lantern.name, "Brass Lantern");
    assert!(lantern.carriable && !lantern.stackable);
    assert_eq!(lantern.sense(Sense::Smell), Some("Lamp oil."));

    // Served from the cache once loaded.
    fs::remove_file(common::manor_dir(&tmp).join("items/lantern.json")).unwrap();
    assert_eq!(loader.load_item("lantern").unwrap().id, "lantern");
    assert!(matches!(loader.load_item("unicorn"), Err(AdventureError::NotFound(_))));
}

#[test]
fn item_quantities_that_overflow_are_malformed() {
    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);
    let hall = common::room_file(&story, "hall");
    let text = fs::read_to_string(&hall).unwrap().replace(
        r#"{ "id": "coin", "quantity": 3 }"#,
        r#"{ "id": "coin", "quantity": 4294967295 }, { "id": "coin", "quantity": 3 }"#,
    );
    fs::write(&hall, text).unwrap();

    let err = common::manor_loader(&tmp).load_world("w1", None).unwrap_err();
    assert!(
        matches!(err, AdventureError::MalformedDescription { ref path, ref reason }
            if path.ends_with("hall.json") && reason.contains("coin")),
        "{:?}",
        err
    );
}

#[test]
fn long_corridors_load_without_deep_recursion() {
    const LENGTH: usize = 20_000;
    let tmp = common::writable_fixture();
    let story = common::manor_dir(&tmp);

    let garden = common::room_file(&story, "garden");
    let text = fs::read_to_string(&garden)
        .unwrap()
        .replace(r#""west": { "id": "hall" },"#, r#""west": { "id": "hall" }, "east": { "id": "c0" },"#);
    fs::write(&garden, text).unwrap();

    for i in 0..LENGTH {
        let back = if i == 0 { "garden".to_string() } else { format!("c{}", i - 1) };
        let forward = if i + 1 < LENGTH {
            format!(r#", "east": {{ "id": "c{}" }}"#, i + 1)
        } else {
            String::new()
        };
        fs::write(
            common::room_file(&story, &format!("c{}", i)),
            format!(
                r#"{{"id": "c{}", "name": "Corridor", "directions": {{ "west": {{ "id": "{}" }}{} }}}}"#,
                i, back, forward
            ),
        )
        .unwrap();
    }

    let world = common::manor_loader(&tmp).load_world("w1", None).unwrap();
    let zone = world.entry_region().unwrap().entry_zone().unwrap();
    assert_eq!(zone.room_count(), 4 + LENGTH);

    let last = zone.room(&format!("c{}", LENGTH - 1)).unwrap();
    let before_last = zone.room(&format!("c{}", LENGTH - 2)).unwrap();
    assert_eq!(world.room(last).neighbor(Direction::West), Some(before_last));
    assert_eq!(world.room(before_last).neighbor(Direction::East), Some(last));
    assert_eq!(world.room(last).neighbor(Direction::East), None);

    let first = zone.room("c0").unwrap();
    assert_eq!(world.room(first).neighbor(Direction::West), zone.room("garden"));
}
