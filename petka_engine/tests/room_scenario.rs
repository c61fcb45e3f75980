use anyhow::Result;
use serde_json::{json, Value};

use petka_engine::game_data::GameData;
use petka_engine::hero::HeroSlot;
use petka_engine::recording::{ServiceEvent, ServiceLog};
use petka_engine::{CursorAction, Engine, EngineConfig, Opcode};

const YARD: u16 = 200;
const BARN: u16 = 201;
const WELL: u16 = 100;
const BUCKET: u16 = 101;
const HAY: u16 = 102;

fn solid(width: i32, height: i32, frames: usize) -> Value {
    let frame = json!({
        "width": width,
        "height": height,
        "pixels": {
            "format": "rgb565",
            "transparent": 0,
            "data": vec![0xFFFFu16; (width * height) as usize],
        }
    });
    json!({
        "bounds": {"left": 0, "top": 0, "right": width, "bottom": height},
        "frames": vec![frame; frames],
        "delay_ms": 100,
        "mask_rects": [{"left": 0, "top": 0, "right": width, "bottom": height}],
    })
}

fn game_data() -> Value {
    json!({
        "start_room": "YARD",
        "objects": [
            {"id": 1, "name": "CURSOR", "kind": {"type": "cursor"}, "z": 1000},
            {"id": 2, "name": "CASE", "kind": {"type": "case"}, "shown": false},
            {"id": 3, "name": "STAR", "kind": {"type": "star"}, "shown": false},
            {"id": 10, "name": "PETKA", "kind": {"type": "hero", "slot": "petka"}},
            {"id": 11, "name": "CHAPAEV", "kind": {"type": "hero", "slot": "chapayev"}},
            {"id": YARD, "name": "YARD", "resource_id": 700,
             "kind": {"type": "background", "music_id": 900}},
            {"id": BARN, "name": "BARN", "resource_id": 701,
             "kind": {"type": "background", "music_id": 901}},
            {"id": WELL, "name": "WELL", "name_on_screen": "Well", "resource_id": 30,
             "reactions": [
                {"opcode": "use", "messages": [
                    {"opcode": "play", "target": WELL, "arg1": 31},
                    {"opcode": "show", "target": BUCKET},
                    {"opcode": "add_inv", "target": BUCKET}
                ]},
                {"opcode": "look", "status": 1, "messages": [
                    {"opcode": "shake", "target": WELL, "arg1": 1}
                ]}
             ]},
            {"id": BUCKET, "name": "BUCKET", "resource_id": 32, "shown": false},
            {"id": HAY, "name": "HAY", "resource_id": 30}
        ],
        "backgrounds": [
            {"obj_id": YARD, "attached": [
                {"id": WELL, "x": 100, "y": 100, "z": 50, "walk_x": 120, "walk_y": 140},
                {"id": BUCKET, "x": 300, "y": 100, "z": 60, "walk_x": -1, "walk_y": -1}
            ]},
            {"obj_id": BARN, "attached": [
                {"id": HAY, "x": 10, "y": 10, "z": 40, "walk_x": -1, "walk_y": -1}
            ]}
        ],
        "resources": {
            "animations": {"30": solid(20, 20, 1), "31": solid(10, 10, 4), "32": solid(8, 8, 1)},
            "sounds": {"900": "yard.ogg", "901": "barn.ogg", "31": "crank.wav"}
        }
    })
}

fn start() -> Result<(Engine, ServiceLog)> {
    let data: GameData = serde_json::from_value(game_data())?;
    let config = EngineConfig {
        rng_seed: Some(3),
        ..EngineConfig::default()
    };
    data.into_engine(config, None)
}

#[test]
fn using_the_well_plays_its_animation_then_finishes_the_reaction() -> Result<()> {
    let (mut engine, services) = start()?;
    engine.update(0);

    engine.set_cursor_action(CursorAction::Use);
    engine.on_left_button_down(105, 105);
    engine.update(0);

    let well = engine.object(WELL).expect("well registered");
    assert_eq!(well.resource_id, 31);
    assert_eq!(well.pending_reaction().map(|pending| pending.id), Some(31));
    assert!(!engine.object(BUCKET).expect("bucket").shown);

    for _ in 0..4 {
        engine.update(100);
        engine.draw_list();
    }

    assert!(engine.object(BUCKET).expect("bucket").shown);
    assert!(engine.object(WELL).expect("well").pending_reaction().is_none());
    let case = engine.object(engine.system().case).expect("case");
    assert_eq!(case.inventory().map(|items| items.items().to_vec()), Some(vec![BUCKET]));
    assert!(services.contains(&ServiceEvent::SoundPlay {
        name: "crank.wav".to_string(),
        looped: false
    }));

    let events = engine.take_events();
    assert!(events.iter().any(|event| event == "reaction.suspend 100 play 31"));
    assert!(events.iter().any(|event| event == "reaction.resume 100 use @1"));
    Ok(())
}

#[test]
fn status_gated_reaction_only_fires_in_its_status() -> Result<()> {
    let (mut engine, services) = start()?;
    engine.update(0);
    engine.set_cursor_action(CursorAction::Look);

    engine.on_left_button_down(105, 105);
    engine.update(0);
    assert!(!services.contains(&ServiceEvent::Shake { enabled: true }));

    engine.object_mut(WELL).expect("well").status = 1;
    engine.on_left_button_down(105, 105);
    engine.update(0);
    assert!(services.contains(&ServiceEvent::Shake { enabled: true }));
    Ok(())
}

#[test]
fn changing_rooms_swaps_objects_and_music() -> Result<()> {
    let (mut engine, services) = start()?;
    engine.update(0);
    assert_eq!(engine.scene().room_id(), Some(YARD));
    assert!(engine.scene().contains(WELL) && engine.scene().contains(BUCKET));

    engine.load_room(BARN, false);
    engine.update(0);

    assert_eq!(engine.scene().room_id(), Some(BARN));
    assert!(!engine.scene().contains(WELL) && !engine.scene().contains(BUCKET));
    assert!(engine.scene().contains(HAY));
    assert!(engine.scene().contains(engine.system().petka));
    assert_eq!(engine.music_id(), 901);
    assert!(services.contains(&ServiceEvent::SoundRemove {
        name: "yard.ogg".to_string()
    }));
    assert!(services.contains(&ServiceEvent::SoundPlay {
        name: "barn.ogg".to_string(),
        looped: true
    }));

    let events = engine.take_events();
    let unload = events.iter().position(|event| event == "room.unload 200");
    let load = events.iter().position(|event| event == "room.load 201");
    assert!(unload.is_some() && load.is_some() && unload < load, "{events:?}");
    let leave_bg = format!("msg.deliver {WELL} {} 0,0,0", Opcode::LeaveBg);
    assert!(events.contains(&leave_bg), "{events:?}");
    Ok(())
}

#[test]
fn clicking_the_floor_walks_petka_there() -> Result<()> {
    let (mut engine, _services) = start()?;
    engine.update(0);
    let petka = engine.system().petka;

    engine.on_left_button_down(40, 30);
    assert!(engine.heroes().get(HeroSlot::Petka).is_walking());
    for _ in 0..5 {
        engine.update(100);
    }

    let position = engine.object(petka).map(|hero| (hero.x, hero.y));
    assert_eq!(position, Some((40, 30)));
    assert!(!engine.heroes().get(HeroSlot::Petka).is_walking());
    Ok(())
}

#[test]
fn hovering_shows_the_on_screen_name() -> Result<()> {
    let (mut engine, _services) = start()?;
    engine.update(0);

    engine.on_mouse_move(110, 110);
    let label = engine.scene().label().expect("label while hovering the well");
    assert_eq!(label.text, "Well");

    engine.on_mouse_move(600, 400);
    assert!(engine.scene().label().is_none());
    Ok(())
}
