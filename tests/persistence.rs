use egui::pos2;
use mapquill::store::{self, FileStore, MAP_RECORD_KEY, MapStore};
use mapquill::{MapCanvas, MapEditor, Tool};

#[test]
fn record_codec_round_trips() {
    let mut canvas = MapCanvas::new(64, 64);
    let tip = mapquill::canvas::PenTip::new();
    canvas.stamp(&tip, pos2(20.0, 20.0), 0.8);
    canvas.stamp(&tip, pos2(40.0, 31.0), 0.9);

    let record = store::encode_record(&canvas).unwrap();
    assert!(record.starts_with("data:image/png;base64,"));
    let decoded = store::decode_record(&record).unwrap();
    assert_eq!(decoded.pixels().as_raw(), canvas.pixels().as_raw());
}

#[test]
fn record_decode_accepts_bare_base64() {
    let canvas = MapCanvas::new(8, 8);
    let record = store::encode_record(&canvas).unwrap();
    let bare = record.strip_prefix("data:image/png;base64,").unwrap();
    let decoded = store::decode_record(bare).unwrap();
    assert_eq!(decoded.pixels().as_raw(), canvas.pixels().as_raw());
}

#[test]
fn record_decode_rejects_garbage() {
    assert!(store::decode_record("data:image/png;base64,!!!not-base64!!!").is_err());
    // Valid base64, not a PNG.
    assert!(store::decode_record("data:image/png;base64,aGVsbG8=").is_err());
}

#[test]
fn file_store_round_trips_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = FileStore::with_dir(dir.path().to_path_buf());

    assert_eq!(s.get(MAP_RECORD_KEY).unwrap(), None);
    s.set(MAP_RECORD_KEY, "data:image/png;base64,AAAA").unwrap();
    assert_eq!(
        s.get(MAP_RECORD_KEY).unwrap().as_deref(),
        Some("data:image/png;base64,AAAA")
    );
    s.remove(MAP_RECORD_KEY).unwrap();
    assert_eq!(s.get(MAP_RECORD_KEY).unwrap(), None);
    // Removing an absent key is not an error.
    s.remove(MAP_RECORD_KEY).unwrap();
}

#[test]
fn editor_state_survives_a_restart() {
    // Draw, finalize a selection, reload from storage — pixel identical.
    let dir = tempfile::tempdir().unwrap();

    let make_editor = || {
        let store = FileStore::with_dir(dir.path().to_path_buf());
        MapEditor::new(512, 512, Box::new(store))
    };

    let mut ed = make_editor();
    ed.pointer_down(Some(pos2(100.0, 100.0)));
    ed.pointer_move(Some(pos2(160.0, 130.0)));
    ed.pointer_up();

    ed.set_tool(Tool::Select);
    ed.pointer_down(Some(pos2(90.0, 90.0)));
    ed.pointer_move(Some(pos2(170.0, 140.0)));
    ed.pointer_up();
    ed.pointer_down(Some(pos2(120.0, 110.0)));
    ed.pointer_move(Some(pos2(220.0, 210.0)));
    ed.pointer_up();
    ed.escape();

    let final_pixels = ed.drawing().pixels().clone();
    drop(ed);

    let restored = make_editor();
    assert_eq!(restored.drawing().pixels().as_raw(), final_pixels.as_raw());
}

#[test]
fn store_failure_does_not_interrupt_drawing() {
    /// A store whose writes always fail.
    struct BrokenStore;
    impl MapStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, String> {
            Err("storage offline".into())
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<(), String> {
            Err("storage offline".into())
        }
        fn remove(&mut self, _key: &str) -> Result<(), String> {
            Err("storage offline".into())
        }
    }

    // Construction tolerates the failing read, drawing works in memory.
    let mut ed = MapEditor::new(512, 512, Box::new(BrokenStore));
    ed.pointer_down(Some(pos2(50.0, 50.0)));
    ed.pointer_move(Some(pos2(80.0, 50.0)));
    ed.pointer_up();
    assert!(ed.drawing().pixels().pixels().any(|p| p[3] > 0));
    ed.clear();
    assert!(ed.drawing().is_blank());
}
