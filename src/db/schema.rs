pub const SCHEMA: &str = r#"
-- Countries: shared, keyed by ISO code ('zz' for unknown)
CREATE TABLE IF NOT EXISTS countries (
    code TEXT PRIMARY KEY,
    name TEXT NOT NULL
);

-- Locations: reverse-geocoded places, keyed by the geocoder's place id
CREATE TABLE IF NOT EXISTS locations (
    id INTEGER PRIMARY KEY,
    lat REAL NOT NULL DEFAULT 0,
    lng REAL NOT NULL DEFAULT 0,
    name TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    place_type TEXT NOT NULL DEFAULT '',
    city TEXT NOT NULL DEFAULT '',
    county TEXT NOT NULL DEFAULT '',
    state TEXT NOT NULL DEFAULT '',
    country TEXT NOT NULL DEFAULT '',
    country_code TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Equipment identity
CREATE TABLE IF NOT EXISTS cameras (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    make TEXT NOT NULL DEFAULT '',
    UNIQUE (model, make)
);

CREATE TABLE IF NOT EXISTS lenses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    model TEXT NOT NULL,
    make TEXT NOT NULL DEFAULT '',
    UNIQUE (model, make)
);

-- Tags: shared labels, unique regardless of case
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL UNIQUE COLLATE NOCASE,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Photos: one row per canonical name
CREATE TABLE IF NOT EXISTS photos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    canonical_name TEXT NOT NULL UNIQUE,
    taken_at TEXT NOT NULL,
    title TEXT,
    favorite INTEGER NOT NULL DEFAULT 0,
    lat REAL NOT NULL DEFAULT 0,
    lng REAL NOT NULL DEFAULT 0,
    artist TEXT NOT NULL DEFAULT '',
    focal_length INTEGER NOT NULL DEFAULT 0,
    aperture REAL NOT NULL DEFAULT 0,
    camera_id INTEGER,
    lens_id INTEGER,
    location_id INTEGER,
    country_code TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    FOREIGN KEY (camera_id) REFERENCES cameras(id),
    FOREIGN KEY (lens_id) REFERENCES lenses(id),
    FOREIGN KEY (location_id) REFERENCES locations(id),
    FOREIGN KEY (country_code) REFERENCES countries(code)
);

CREATE INDEX IF NOT EXISTS idx_photos_taken_at ON photos(taken_at);

CREATE TABLE IF NOT EXISTS photo_tags (
    photo_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (photo_id, tag_id),
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_photo_tags_tag ON photo_tags(tag_id);

-- Files: physical files, matched by hash or relative name
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    photo_id INTEGER NOT NULL,
    name TEXT NOT NULL UNIQUE,
    hash TEXT NOT NULL,
    file_type TEXT NOT NULL,
    mime TEXT NOT NULL DEFAULT '',
    orientation INTEGER NOT NULL DEFAULT 0,
    width INTEGER NOT NULL DEFAULT 0,
    height INTEGER NOT NULL DEFAULT 0,
    aspect_ratio REAL NOT NULL DEFAULT 0,
    portrait INTEGER NOT NULL DEFAULT 0,
    main_color TEXT NOT NULL DEFAULT '',
    colors TEXT NOT NULL DEFAULT '',
    luminance TEXT NOT NULL DEFAULT '',
    chroma INTEGER NOT NULL DEFAULT 0,
    is_primary INTEGER NOT NULL DEFAULT 0,
    missing INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (photo_id) REFERENCES photos(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_files_photo ON files(photo_id);
CREATE INDEX IF NOT EXISTS idx_files_hash ON files(hash);
"#;
