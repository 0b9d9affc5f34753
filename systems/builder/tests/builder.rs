use gridvale_core::{Command, GridPos, StructureKind};
use gridvale_system_builder::{Builder, BuilderInput, PlacementPreview};

fn selected_builder(kind: StructureKind) -> Builder {
    let mut builder = Builder::new();
    builder.select(Some(kind));
    builder
}

#[test]
fn confirm_emits_place_command_for_valid_preview() {
    let mut builder = selected_builder(StructureKind::House);
    let mut commands = Vec::new();
    let cell = GridPos::new(2, 2);

    let preview = builder.preview(Some(cell), |_, _| true);
    builder.handle(
        preview,
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert_eq!(
        commands,
        vec![Command::PlaceStructure {
            kind: StructureKind::House,
            at: cell,
        }],
        "builder should emit a placement command when confirming a valid preview",
    );
}

#[test]
fn confirm_ignored_when_preview_not_placeable() {
    let mut builder = selected_builder(StructureKind::Factory);
    let mut commands = Vec::new();

    let preview = builder.preview(Some(GridPos::new(2, 2)), |_, _| false);
    builder.handle(
        preview,
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert!(commands.is_empty(), "invalid preview must not emit commands");
}

#[test]
fn no_preview_without_a_selection() {
    let builder = Builder::new();
    assert_eq!(builder.preview(Some(GridPos::new(0, 0)), |_, _| true), None);
}

#[test]
fn no_preview_with_cursor_off_the_grid() {
    let builder = selected_builder(StructureKind::Silo);
    assert_eq!(builder.preview(None, |_, _| true), None);
}

#[test]
fn selection_survives_a_confirmed_placement() {
    let mut builder = selected_builder(StructureKind::Farm);
    let mut commands = Vec::new();

    let preview = builder.preview(Some(GridPos::new(1, 1)), |_, _| true);
    builder.handle(
        preview,
        BuilderInput {
            confirm_action: true,
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert_eq!(builder.selected(), Some(StructureKind::Farm));
}

#[test]
fn remove_emits_command_when_structure_present() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();
    let hovered_cell = GridPos::new(2, 2);
    let mut looked_up = None;

    builder.handle(
        None,
        BuilderInput {
            remove_action: true,
            cursor_cell: Some(hovered_cell),
            ..BuilderInput::default()
        },
        |cell| {
            looked_up = Some(cell);
            Some(StructureKind::Tower)
        },
        &mut commands,
    );

    assert_eq!(looked_up, Some(hovered_cell));
    assert_eq!(
        commands,
        vec![Command::RemoveStructure { at: hovered_cell }],
        "remove action should target the structure under the cursor",
    );
}

#[test]
fn remove_ignored_when_no_structure_present() {
    let mut builder = Builder::new();
    let mut commands = Vec::new();

    builder.handle(
        None,
        BuilderInput {
            remove_action: true,
            cursor_cell: Some(GridPos::new(1, 1)),
            ..BuilderInput::default()
        },
        |_| None,
        &mut commands,
    );

    assert!(
        commands.is_empty(),
        "no structure under cursor, nothing to remove"
    );
}

#[test]
fn idle_input_emits_nothing() {
    let mut builder = selected_builder(StructureKind::House);
    let mut commands = Vec::new();

    let preview = builder.preview(Some(GridPos::new(3, 3)), |_, _| true);
    builder.handle(preview, BuilderInput::default(), |_| None, &mut commands);

    assert!(commands.is_empty());
}
