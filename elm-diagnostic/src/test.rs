use crate::{Diagnostic, Location, Message, Position, Source, Sources};
use pretty_assertions::assert_eq;

#[test]
fn test_1() {
    assert_eq!(
        Diagnostic::report_located_message(
            Position { line: 5, column: 3 },
            "Main.elm",
            "main = foo",
            &Message {
                content: String::from("Infinite recursion"),
                addendum: None
            },
        ),
        [
            "Main.elm:5:3: error: Infinite recursion",
            "  |",
            "5 | main = foo",
            "  |   ^",
        ]
        .join("\n")
    )
}

#[test]
fn test_2() {
    assert_eq!(
        Diagnostic::report_located_message(
            Position {
                line: 10,
                column: 2
            },
            "Main.elm",
            "main = ()",
            &Message {
                content: String::from("Type mismatch."),
                addendum: Some(String::from("Required: Int\nFound: ()"))
            }
        ),
        [
            "Main.elm:10:2: error: Type mismatch.",
            "   |",
            "10 | main = ()",
            "   |  ^",
            "Required: Int",
            "Found: ()",
        ]
        .join("\n")
    )
}

#[test]
fn position_of_offset() {
    let text = "module Main\n\nmain = ()\n";
    assert_eq!(Position { line: 1, column: 1 }, Position::of_offset(text, 0));
    assert_eq!(Position { line: 3, column: 8 }, Position::of_offset(text, 20));
    assert_eq!(Position { line: 4, column: 1 }, Position::of_offset(text, 100))
}

#[test]
fn position_inside_multibyte_char() {
    // 'é' spans bytes 5 and 6
    let text = "x = \"é\"";
    assert_eq!(Position { line: 1, column: 6 }, Position::of_offset(text, 6));
    assert_eq!(Position { line: 1, column: 6 }, Position::of_offset(text, 5))
}

#[test]
fn report_without_source_text() {
    let source = Source::Interactive {
        label: String::from("repl"),
    };
    let mut diagnostic = Diagnostic::new();
    diagnostic.item(
        Some(Location {
            source,
            offset: Some(42),
        }),
        Message::from_lines("Infinite recursion"),
    );
    assert_eq!(
        "repl: error: Infinite recursion",
        diagnostic.report_all(&Sources::default())
    )
}

#[test]
fn message_from_lines() {
    assert_eq!(
        Message {
            content: String::from("Type mismatch."),
            addendum: Some(String::from("Required: Int\nFound: ()"))
        },
        Message::from_lines("Type mismatch.\nRequired: Int\nFound: ()")
    );
    assert_eq!(
        Message {
            content: String::from("Infinite recursion"),
            addendum: None
        },
        Message::from_lines("Infinite recursion")
    )
}

#[test]
fn report_all_orders_by_offset() {
    let source = Source::Interactive {
        label: String::from("repl"),
    };
    let mut sources = Sources::default();
    sources.insert(source.clone(), String::from("a = b\nb = a"));

    let mut diagnostic = Diagnostic::new();
    diagnostic.item(
        Some(Location {
            source: source.clone(),
            offset: Some(10),
        }),
        Message::from_lines("second"),
    );
    diagnostic.item(
        Some(Location {
            source,
            offset: Some(4),
        }),
        Message::from_lines("first"),
    );
    diagnostic.item(None, Message::from_lines("unlocated"));

    assert_eq!(3, diagnostic.len());
    assert_eq!(
        [
            "error: unlocated",
            "repl:1:5: error: first",
            "  |",
            "1 | a = b",
            "  |     ^",
            "repl:2:5: error: second",
            "  |",
            "2 | b = a",
            "  |     ^",
        ]
        .join("\n"),
        diagnostic.report_all(&sources)
    )
}
