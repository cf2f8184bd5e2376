//! MTL material library parser.

use anyhow::{Context, Result, anyhow};

#[derive(Clone, Debug, PartialEq)]
pub struct MtlMaterial {
    pub name: String,
    /// `Kd`
    pub diffuse: Option<[f32; 3]>,
    /// `Ks`
    pub specular: Option<[f32; 3]>,
    /// `Ke`
    pub emissive: Option<[f32; 3]>,
    /// `Ns`
    pub shininess: Option<f32>,
    /// `d`, or `1 - Tr`.
    pub dissolve: Option<f32>,
    /// `map_Kd` path relative to the library's base location.
    pub diffuse_map: Option<String>,
}

impl MtlMaterial {
    fn new(name: String) -> Self {
        Self {
            name,
            diffuse: None,
            specular: None,
            emissive: None,
            shininess: None,
            dissolve: None,
            diffuse_map: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MtlLibrary {
    pub materials: Vec<MtlMaterial>,
}

impl MtlLibrary {
    pub fn get(&self, name: &str) -> Option<&MtlMaterial> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// Texture paths referenced by the library, deduplicated, in order.
    pub fn texture_paths(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for path in self.materials.iter().filter_map(|m| m.diffuse_map.as_deref()) {
            if !out.contains(&path) {
                out.push(path);
            }
        }
        out
    }
}

pub fn load_mtl_from_bytes(bytes: &[u8]) -> Result<MtlLibrary> {
    let text = std::str::from_utf8(bytes).context("MTL library is not valid UTF-8")?;
    load_mtl_from_str(text)
}

pub fn load_mtl_from_str(contents: &str) -> Result<MtlLibrary> {
    let mut lib = MtlLibrary::default();
    let mut current: Option<MtlMaterial> = None;

    for (line_no, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut parts = trimmed.split_whitespace().peekable();
        let Some(tag) = parts.next() else { continue };

        if tag == "newmtl" {
            if let Some(done) = current.take() {
                lib.materials.push(done);
            }
            let name = parts.collect::<Vec<_>>().join(" ");
            if name.is_empty() {
                anyhow::bail!("newmtl without a name on line {}", line_no + 1);
            }
            current = Some(MtlMaterial::new(name));
            continue;
        }

        let mat = current
            .as_mut()
            .ok_or_else(|| anyhow!("'{}' before any newmtl on line {}", tag, line_no + 1))?;

        match tag.to_ascii_lowercase().as_str() {
            "kd" => {
                if let Some(rgb) = parse_color(parts, line_no)? {
                    mat.diffuse = Some(rgb);
                }
            }
            "ks" => {
                if let Some(rgb) = parse_color(parts, line_no)? {
                    mat.specular = Some(rgb);
                }
            }
            "ke" => {
                if let Some(rgb) = parse_color(parts, line_no)? {
                    mat.emissive = Some(rgb);
                }
            }
            "ns" => mat.shininess = Some(parse_scalar(parts.next(), line_no, "Ns")?),
            "d" => {
                let value = parts.find(|t| *t != "-halo");
                mat.dissolve = Some(parse_scalar(value, line_no, "d")?);
            }
            "tr" => mat.dissolve = Some(1.0 - parse_scalar(parts.next(), line_no, "Tr")?),
            "map_kd" => mat.diffuse_map = texture_path(parts),
            _ => {
                // Ka, illum, other maps and vendor keys are not used by the viewer.
            }
        }
    }

    if let Some(done) = current {
        lib.materials.push(done);
    }
    Ok(lib)
}

fn parse_scalar(token: Option<&str>, line_no: usize, what: &str) -> Result<f32> {
    token
        .ok_or_else(|| anyhow!("Missing {} value on line {}", what, line_no + 1))?
        .parse::<f32>()
        .with_context(|| format!("Failed to parse {} on line {}", what, line_no + 1))
}

/// `Kd`/`Ks`/`Ke` value. CIE `xyz` and `spectral` forms are skipped with a
/// warning and yield `None`.
fn parse_color<'a>(
    mut parts: std::iter::Peekable<impl Iterator<Item = &'a str>>,
    line_no: usize,
) -> Result<Option<[f32; 3]>> {
    if let Some(form) = parts.next_if(|t| matches!(*t, "xyz" | "spectral")) {
        log::warn!("Ignoring unsupported {} color on MTL line {}", form, line_no + 1);
        return Ok(None);
    }
    parse_rgb(parts, line_no).map(Some)
}

/// `r [g b]`: a single value is used for all three channels.
fn parse_rgb<'a>(mut parts: impl Iterator<Item = &'a str>, line_no: usize) -> Result<[f32; 3]> {
    let r = parse_scalar(parts.next(), line_no, "color")?;
    let g = match parts.next() {
        Some(t) => parse_scalar(Some(t), line_no, "color")?,
        None => return Ok([r, r, r]),
    };
    let b = parse_scalar(parts.next(), line_no, "color")?;
    Ok([r, g, b])
}

/// Strip `-opt value...` texture options and join the rest as the file name.
fn texture_path<'a>(parts: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut rest: Vec<&str> = Vec::new();
    let mut in_option = false;
    for token in parts {
        if rest.is_empty() && token.starts_with('-') && token.parse::<f32>().is_err() {
            in_option = true;
            continue;
        }
        if in_option && rest.is_empty() && is_option_value(token) {
            continue;
        }
        in_option = false;
        rest.push(token);
    }
    (!rest.is_empty()).then(|| rest.join(" "))
}

fn is_option_value(token: &str) -> bool {
    token.parse::<f32>().is_ok() || matches!(token, "on" | "off")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB: &str = "
        # exported
        newmtl Body
        Ka 0.1 0.1 0.1
        Kd 0.8 0.5 0.2
        Ks 0.5
        Ns 96.0
        d 0.75
        illum 2
        map_Kd -s 1 1 1 -bm 0.5 textures/body diffuse.jpg

        newmtl Glass
        Tr 0.9
        map_Kd glass.png
        newmtl Body2
        map_Kd textures/body diffuse.jpg
    ";

    #[test]
    fn parses_colors_and_maps() {
        let lib = load_mtl_from_str(LIB).expect("parse");
        assert_eq!(lib.materials.len(), 3);

        let body = lib.get("Body").expect("Body");
        assert_eq!(body.diffuse, Some([0.8, 0.5, 0.2]));
        assert_eq!(body.specular, Some([0.5, 0.5, 0.5]));
        assert_eq!(body.shininess, Some(96.0));
        assert_eq!(body.dissolve, Some(0.75));
        assert_eq!(body.diffuse_map.as_deref(), Some("textures/body diffuse.jpg"));

        let glass = lib.get("Glass").expect("Glass");
        assert!((glass.dissolve.unwrap() - 0.1).abs() < 1e-6);
    }

    #[test]
    fn texture_paths_are_deduplicated() {
        let lib = load_mtl_from_str(LIB).expect("parse");
        assert_eq!(lib.texture_paths(), vec!["textures/body diffuse.jpg", "glass.png"]);
    }

    #[test]
    fn property_before_newmtl_is_rejected() {
        assert!(load_mtl_from_str("Kd 1 1 1\n").is_err());
        assert!(load_mtl_from_str("newmtl a\nKd x y z\n").is_err());
    }

    #[test]
    fn halo_dissolve_is_read() {
        let lib = load_mtl_from_str("newmtl A\nKd 1 1 1\nd -halo 0.5\nmap_Kd a.png\n").expect("parse");
        let a = lib.get("A").expect("A");
        assert_eq!(a.dissolve, Some(0.5));
        assert_eq!(a.diffuse_map.as_deref(), Some("a.png"));
    }

    #[test]
    fn xyz_and_spectral_colors_are_skipped() {
        let src = "newmtl A\nKa xyz 0.1 0.1 0.1\nKd spectral file.rfl\nKs 0.2\nillum x\nmap_Kd a.png\n";
        let lib = load_mtl_from_str(src).expect("parse");
        let a = lib.get("A").expect("A");
        assert_eq!(a.diffuse, None);
        assert_eq!(a.specular, Some([0.2, 0.2, 0.2]));
        assert_eq!(a.diffuse_map.as_deref(), Some("a.png"));

        let lib = load_mtl_from_str("newmtl B\nKd xyz 0.3 0.4 0.5\n").expect("parse");
        assert_eq!(lib.get("B").expect("B").diffuse, None);
    }
}
