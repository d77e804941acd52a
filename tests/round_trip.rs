use trait_codec::{
    build_group, decode_group, encode_group, BoundingBox, Color, EncoderConfig, IndexWidth,
    PaletteChannels, PixelGrid, RleVariant, TraitRuns, TraitSource,
};

/// Small deterministic generator so every run of the suite sees the same grids.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    fn below(&mut self, n: u32) -> u32 {
        self.next() % n
    }
}

fn random_grid(rng: &mut Lcg, width: usize, height: usize, colors: &[Color]) -> PixelGrid {
    let mut grid = PixelGrid::transparent(width, height).unwrap();
    // A random rectangle of mostly-solid color with holes, like a sprite.
    let x1 = rng.below(width as u32) as usize;
    let y1 = rng.below(height as u32) as usize;
    let x2 = x1 + rng.below((width - x1) as u32) as usize;
    let y2 = y1 + rng.below((height - y1) as u32) as usize;
    for y in y1..=y2 {
        let mut color = colors[rng.below(colors.len() as u32) as usize];
        for x in x1..=x2 {
            if rng.below(4) == 0 {
                color = colors[rng.below(colors.len() as u32) as usize];
            }
            grid.set(x, y, color);
        }
    }
    grid
}

/// What a decoder can give back: transparency collapsed and alpha forced for RGB.
fn canonical(grid: &PixelGrid, config: &EncoderConfig) -> PixelGrid {
    let pixels = grid
        .pixels()
        .iter()
        .map(|&c| config.palette_color(c).unwrap_or(Color::TRANSPARENT))
        .collect();
    PixelGrid::new(grid.width(), grid.height(), pixels).unwrap()
}

fn check_round_trip(config: &EncoderConfig, colors: &[Color], seed: u64) {
    let mut rng = Lcg(seed);
    let sources: Vec<TraitSource> = (0..6)
        .map(|i| TraitSource::new(format!("Trait {i}"), random_grid(&mut rng, 48, 48, colors)))
        .collect();

    let group = build_group("Round Trip", &sources, config).unwrap();
    let blob = group.to_bytes().unwrap();
    let decoded = decode_group(&blob, config.layout()).unwrap();
    assert_eq!(decoded, group);

    let offset = usize::from(config.include_none_slot);
    for (source, t) in sources.iter().zip(&decoded.traits[offset..]) {
        let rebuilt = t.to_grid(&decoded.palette, 48, 48).unwrap();
        assert_eq!(rebuilt, canonical(&source.pixels, config), "trait {}", t.name);
    }
}

fn sprite_colors() -> Vec<Color> {
    vec![
        Color::TRANSPARENT,
        Color::rgba(12, 34, 56, 0), // transparent with stray channels
        Color::rgb(255, 0, 0),
        Color::rgb(0, 255, 0),
        Color::rgb(0, 0, 255),
        Color::rgb(0, 0, 0),
    ]
}

#[test]
fn test_round_trip_row_sparse_rgba() {
    let mut colors = sprite_colors();
    colors.push(Color::rgba(200, 100, 50, 128));
    for seed in 0..20 {
        check_round_trip(&EncoderConfig::default(), &colors, seed);
    }
}

#[test]
fn test_round_trip_row_sparse_rgb() {
    let config = EncoderConfig {
        palette_channels: PaletteChannels::Rgb,
        ..Default::default()
    };
    for seed in 0..20 {
        check_round_trip(&config, &sprite_colors(), seed);
    }
}

#[test]
fn test_round_trip_linear_rgba() {
    let config = EncoderConfig {
        rle_variant: RleVariant::Linear,
        ..Default::default()
    };
    let mut colors = sprite_colors();
    colors.push(Color::rgba(200, 100, 50, 128));
    for seed in 0..20 {
        check_round_trip(&config, &colors, seed);
    }
}

#[test]
fn test_round_trip_with_magic_transparent() {
    let magic = Color::rgb(255, 0, 255);
    let config = EncoderConfig {
        magic_transparent: Some(magic),
        ..Default::default()
    };
    let mut colors = sprite_colors();
    colors.push(magic);
    for seed in 0..10 {
        check_round_trip(&config, &colors, seed);
    }
}

#[test]
fn test_palette_section_is_deterministic() {
    let mut rng = Lcg(7);
    let sources: Vec<TraitSource> = (0..4)
        .map(|i| TraitSource::new(format!("T{i}"), random_grid(&mut rng, 24, 24, &sprite_colors())))
        .collect();
    let config = EncoderConfig::default();
    let first = encode_group("Eyes", &sources, &config).unwrap();
    let second = encode_group("Eyes", &sources, &config).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_frequency_beats_first_sprite_order() {
    let black: Color = "#000000ff".parse().unwrap();
    let white: Color = "#ffffffff".parse().unwrap();
    let a = PixelGrid::new(3, 1, vec![black, white, white]).unwrap();
    let b = PixelGrid::new(3, 1, vec![white, white, black]).unwrap();
    let group = build_group(
        "Scenario",
        &[TraitSource::new("A", a), TraitSource::new("B", b)],
        &EncoderConfig::default(),
    )
    .unwrap();
    assert_eq!(group.palette.colors(), &[white, black]);
}

fn distinct_colors(n: usize) -> PixelGrid {
    let pixels: Vec<Color> = (0..256)
        .map(|i| {
            if i < n {
                Color::rgb(i as u8, 1, 2)
            } else {
                Color::TRANSPARENT
            }
        })
        .collect();
    PixelGrid::new(16, 16, pixels).unwrap()
}

#[test]
fn test_index_width_threshold_in_blob() {
    let config = EncoderConfig::default();
    for (n, width) in [(255, IndexWidth::One), (256, IndexWidth::Two)] {
        let sources = [TraitSource::new("Many", distinct_colors(n))];
        let group = build_group("Colors", &sources, &config).unwrap();
        assert_eq!(group.palette.len(), n);
        assert_eq!(group.index_width, width);
        let blob = group.to_bytes().unwrap();
        // name (1 + 6) + palette count (2) + palette (4n), then the width tag
        assert_eq!(blob[9 + 4 * n], width as u8);
        assert_eq!(decode_group(&blob, config.layout()).unwrap(), group);
    }
}

#[test]
fn test_empty_sprite() {
    for rle_variant in [RleVariant::Linear, RleVariant::RowSparse] {
        let config = EncoderConfig {
            rle_variant,
            include_none_slot: false,
            ..Default::default()
        };
        let sources = [TraitSource::new("Blank", PixelGrid::transparent(48, 48).unwrap())];
        let blob = encode_group("Empty", &sources, &config).unwrap();
        let decoded = decode_group(&blob, config.layout()).unwrap();
        let t = &decoded.traits[0];
        assert_eq!(t.bounds, BoundingBox::EMPTY);
        assert!(t.is_empty());
        assert!(decoded.palette.is_empty());
        let grid = t.to_grid(&decoded.palette, 48, 48).unwrap();
        assert!(grid.pixels().iter().all(|c| c.is_transparent()));
    }
}

#[test]
fn test_two_red_pixels_scenario() {
    let red = Color::rgba(255, 0, 0, 255);
    let config = EncoderConfig {
        rle_variant: RleVariant::Linear,
        include_none_slot: false,
        ..Default::default()
    };
    let sources = [TraitSource::new("Red", PixelGrid::new(2, 1, vec![red, red]).unwrap())];
    let group = build_group("G", &sources, &config).unwrap();
    assert_eq!(group.palette.colors(), &[red]);
    let t = &group.traits[0];
    assert_eq!(t.bounds, BoundingBox { x1: 0, y1: 0, x2: 1, y2: 0 });
    match &t.runs {
        TraitRuns::Linear(runs) => {
            assert_eq!(runs.len(), 1);
            assert_eq!((runs[0].length, runs[0].index), (2, 0));
        }
        other => panic!("expected linear runs, got {other:?}"),
    }
}

#[test]
fn test_runs_stay_within_bounds() {
    let red = Color::rgb(255, 0, 0);
    let grid = PixelGrid::new(256, 1, vec![red; 256]).unwrap();
    for rle_variant in [RleVariant::Linear, RleVariant::RowSparse] {
        let config = EncoderConfig {
            rle_variant,
            ..Default::default()
        };
        let group = build_group("Wide", &[TraitSource::new("Bar", grid.clone())], &config).unwrap();
        let lengths: Vec<u8> = match &group.traits[1].runs {
            TraitRuns::Linear(runs) => runs.iter().map(|r| r.length).collect(),
            TraitRuns::Rows(rows) => rows[0].runs.iter().map(|r| r.length).collect(),
        };
        assert_eq!(lengths, vec![255, 1]);
    }
}

#[test]
fn test_failing_group_does_not_affect_sibling() {
    let holey = PixelGrid::new(3, 1, vec![Color::rgb(1, 1, 1), Color::TRANSPARENT, Color::rgb(1, 1, 1)])
        .unwrap();
    let solid = PixelGrid::new(2, 1, vec![Color::rgb(1, 1, 1); 2]).unwrap();
    let config = EncoderConfig {
        rle_variant: RleVariant::Linear,
        palette_channels: PaletteChannels::Rgb,
        ..Default::default()
    };
    assert!(encode_group("Bad", &[TraitSource::new("Holey", holey)], &config).is_err());
    let blob = encode_group("Good", &[TraitSource::new("Solid", solid)], &config).unwrap();
    assert_eq!(decode_group(&blob, config.layout()).unwrap().name, "Good");
}
