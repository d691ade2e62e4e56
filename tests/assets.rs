use movingtexture::{CliArgs, DemoConfig};

#[test]
fn bundled_texture_decodes() {
    let config = DemoConfig::default();
    let img = image::open(&config.texture_path).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (64, 64));
}

#[test]
fn sample_config_spells_out_the_defaults() {
    let args = CliArgs::parse(["--config".to_string(), "assets/demo.toml".to_string()]).unwrap();
    assert_eq!(DemoConfig::resolve(&args).unwrap(), DemoConfig::default());
}
