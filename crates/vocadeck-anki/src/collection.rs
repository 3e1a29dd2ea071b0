//! The `collection.anki2` SQLite database inside a package.

use rusqlite::{params, Connection};
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};

use crate::models::NoteType;
use crate::notes::Note;
use crate::render::strip_html;

/// Schema of an Anki 2.1 legacy (version 11) collection.
const SCHEMA: &str = r#"
CREATE TABLE col (
    id              integer primary key,
    crt             integer not null,
    mod             integer not null,
    scm             integer not null,
    ver             integer not null,
    dty             integer not null,
    usn             integer not null,
    ls              integer not null,
    conf            text not null,
    models          text not null,
    decks           text not null,
    dconf           text not null,
    tags            text not null
);
CREATE TABLE notes (
    id              integer primary key,
    guid            text not null,
    mid             integer not null,
    mod             integer not null,
    usn             integer not null,
    tags            text not null,
    flds            text not null,
    sfld            integer not null,
    csum            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE cards (
    id              integer primary key,
    nid             integer not null,
    did             integer not null,
    ord             integer not null,
    mod             integer not null,
    usn             integer not null,
    type            integer not null,
    queue           integer not null,
    due             integer not null,
    ivl             integer not null,
    factor          integer not null,
    reps            integer not null,
    lapses          integer not null,
    left            integer not null,
    odue            integer not null,
    odid            integer not null,
    flags           integer not null,
    data            text not null
);
CREATE TABLE revlog (
    id              integer primary key,
    cid             integer not null,
    usn             integer not null,
    ease            integer not null,
    ivl             integer not null,
    lastIvl         integer not null,
    factor          integer not null,
    time            integer not null,
    type            integer not null
);
CREATE TABLE graves (
    usn             integer not null,
    oid             integer not null,
    type            integer not null
);
CREATE INDEX ix_notes_usn on notes (usn);
CREATE INDEX ix_cards_usn on cards (usn);
CREATE INDEX ix_revlog_usn on revlog (usn);
CREATE INDEX ix_cards_nid on cards (nid);
CREATE INDEX ix_cards_sched on cards (did, queue, due);
CREATE INDEX ix_revlog_cid on revlog (cid);
CREATE INDEX ix_notes_csum on notes (csum);
"#;

/// Field separator in `notes.flds`.
const FIELD_SEPARATOR: &str = "\u{1f}";

/// A deck in the collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// Writes decks, note types and notes into a fresh collection database.
pub struct CollectionWriter<'a> {
    conn: &'a mut Connection,
    /// Milliseconds since the epoch
    now_ms: i64,
}

impl<'a> CollectionWriter<'a> {
    pub fn new(conn: &'a mut Connection, now_ms: i64) -> Self {
        Self { conn, now_ms }
    }

    fn now_secs(&self) -> i64 {
        self.now_ms / 1000
    }

    /// Create the schema and the `col` row.
    pub fn init(&mut self, deck: &Deck, note_types: &[NoteType]) -> rusqlite::Result<()> {
        self.conn.execute_batch(SCHEMA)?;

        let models: Map<String, Value> = note_types
            .iter()
            .map(|nt| (nt.id.to_string(), nt.to_json(deck.id, self.now_secs())))
            .collect();

        let mut decks = Map::new();
        decks.insert("1".to_string(), deck_json(1, "Default", "", self.now_secs()));
        decks.insert(
            deck.id.to_string(),
            deck_json(deck.id, &deck.name, &deck.description, self.now_secs()),
        );

        let conf = json!({
            "activeDecks": [1],
            "addToCur": true,
            "collapseTime": 1200,
            "curDeck": 1,
            "curModel": note_types.first().map(|nt| nt.id.to_string()),
            "dueCounts": true,
            "estTimes": true,
            "newBury": true,
            "newSpread": 0,
            "nextPos": 1,
            "sortBackwards": false,
            "sortType": "noteFld",
            "timeLim": 0,
        });

        self.conn.execute(
            "INSERT INTO col VALUES (null, ?1, ?2, ?3, 11, 0, 0, 0, ?4, ?5, ?6, ?7, '{}')",
            params![
                self.now_secs() - self.now_secs() % 86_400,
                self.now_ms,
                self.now_ms,
                conf.to_string(),
                Value::Object(models).to_string(),
                Value::Object(decks).to_string(),
                default_deck_config().to_string(),
            ],
        )?;

        Ok(())
    }

    /// Insert notes with one new card each. `model_id` maps a note to its
    /// note type id.
    pub fn insert_notes<F>(
        &mut self,
        deck_id: i64,
        notes: &[Note],
        model_id: F,
    ) -> rusqlite::Result<usize>
    where
        F: Fn(&Note) -> i64,
    {
        let now_secs = self.now_secs();
        let base_id = self.now_ms;
        let tx = self.conn.transaction()?;

        {
            let mut note_stmt = tx.prepare(
                "INSERT INTO notes VALUES (?1, ?2, ?3, ?4, -1, ?5, ?6, ?7, ?8, 0, '')",
            )?;
            let mut card_stmt = tx.prepare(
                "INSERT INTO cards VALUES (?1, ?2, ?3, 0, ?4, -1, 0, 0, ?5, 0, 0, 0, 0, 0, 0, 0, 0, '')",
            )?;

            for (i, note) in notes.iter().enumerate() {
                let id = base_id + i as i64;
                let fields = note.ordered_fields().join(FIELD_SEPARATOR);

                note_stmt.execute(params![
                    id,
                    note.guid,
                    model_id(note),
                    now_secs,
                    format_tags(&note.tags),
                    fields,
                    note.sort_field(),
                    checksum(note.sort_field()),
                ])?;

                card_stmt.execute(params![id, id, deck_id, now_secs, i as i64])?;
            }
        }

        tx.commit()?;
        Ok(notes.len())
    }
}

/// Tags are stored space-separated with a leading and trailing space.
fn format_tags(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" {} ", tags.join(" "))
    }
}

/// First 8 hex digits of the SHA-1 of the HTML-stripped field.
pub fn checksum(field: &str) -> i64 {
    let digest = Sha1::digest(strip_html(field).as_bytes());
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&digest[..4]);
    i64::from(u32::from_be_bytes(bytes))
}

fn deck_json(id: i64, name: &str, description: &str, modified: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": description,
        "mod": modified,
        "usn": -1,
        "conf": 1,
        "dyn": 0,
        "collapsed": false,
        "browserCollapsed": false,
        "extendNew": 0,
        "extendRev": 50,
        "newToday": [0, 0],
        "revToday": [0, 0],
        "lrnToday": [0, 0],
        "timeToday": [0, 0],
    })
}

fn default_deck_config() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "autoplay": true,
            "maxTaken": 60,
            "replayq": true,
            "timer": 0,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
        }
    })
}
