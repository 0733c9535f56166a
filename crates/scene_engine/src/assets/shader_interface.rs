//! Shader parameter discovery
//!
//! Scans GLSL stage sources for `uniform` declarations so materials can be
//! validated without compiling anything. Uniform structs are flattened into
//! `instance.member` names; uniform blocks are shared engine data, not
//! material parameters, and are skipped.
//!
//! ```glsl
//! struct Material {
//!     sampler2D Diffuse;
//!     float     Shininess;
//! };
//! uniform Material u_Material;   // -> u_Material.Diffuse, u_Material.Shininess
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// GLSL type of a bindable parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// `float`
    Float,
    /// `int`
    Int,
    /// `uint`
    UInt,
    /// `bool`
    Bool,
    /// `vec2`
    Vec2,
    /// `vec3`
    Vec3,
    /// `vec4`
    Vec4,
    /// `mat3`
    Mat3,
    /// `mat4`
    Mat4,
    /// `sampler1D`
    Sampler1D,
    /// `sampler2D`
    Sampler2D,
    /// `sampler3D`
    Sampler3D,
    /// `samplerCube`
    SamplerCube,
}

impl ParamType {
    /// Map a GLSL type name
    pub fn from_glsl(name: &str) -> Option<Self> {
        Some(match name {
            "float" => Self::Float,
            "int" => Self::Int,
            "uint" => Self::UInt,
            "bool" => Self::Bool,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "mat3" => Self::Mat3,
            "mat4" => Self::Mat4,
            "sampler1D" => Self::Sampler1D,
            "sampler2D" => Self::Sampler2D,
            "sampler3D" => Self::Sampler3D,
            "samplerCube" => Self::SamplerCube,
            _ => return None,
        })
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::UInt => "uint",
            Self::Bool => "bool",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Mat3 => "mat3",
            Self::Mat4 => "mat4",
            Self::Sampler1D => "sampler1D",
            Self::Sampler2D => "sampler2D",
            Self::Sampler3D => "sampler3D",
            Self::SamplerCube => "samplerCube",
        };
        f.write_str(name)
    }
}

/// Set of material parameters a shader program declares
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderInterface {
    params: BTreeMap<String, ParamType>,
}

impl ShaderInterface {
    /// Parse every stage source and merge the results
    pub fn from_sources<'a>(sources: impl IntoIterator<Item = &'a str>) -> Self {
        let mut interface = Self::default();
        for source in sources {
            interface.merge(Self::parse(source));
        }
        interface
    }

    /// Parse a single GLSL source
    pub fn parse(source: &str) -> Self {
        let cleaned = strip_preprocessor(&strip_comments(source));
        let tokens = tokenize(&cleaned);
        let mut parser = Parser { tokens: &tokens, pos: 0, structs: HashMap::new() };
        let mut interface = Self::default();
        parser.run(&mut interface);
        interface
    }

    /// Add another interface's parameters
    pub fn merge(&mut self, other: Self) {
        for (name, param_type) in other.params {
            if let Some(existing) = self.params.insert(name.clone(), param_type) {
                if existing != param_type {
                    log::warn!(
                        "Uniform {} declared as {} and {} across stages",
                        name,
                        existing,
                        param_type
                    );
                }
            }
        }
    }

    /// Declared type of a parameter
    pub fn get(&self, name: &str) -> Option<ParamType> {
        self.params.get(name).copied()
    }

    /// Whether the parameter is declared
    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    /// Declared parameters in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ParamType)> {
        self.params.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Number of parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether no parameters are declared
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

const QUALIFIERS: &[&str] = &[
    "lowp", "mediump", "highp", "const", "flat", "smooth", "noperspective",
    "readonly", "writeonly", "coherent", "volatile", "restrict",
];

/// Declared field of a struct: type name, field name
type Field = (String, String);

struct Parser<'t> {
    tokens: &'t [&'t str],
    pos: usize,
    structs: HashMap<String, Vec<Field>>,
}

impl<'t> Parser<'t> {
    fn run(&mut self, interface: &mut ShaderInterface) {
        while let Some(token) = self.next() {
            match token {
                "struct" => self.parse_struct(),
                "uniform" => self.parse_uniform(interface),
                _ => {}
            }
        }
    }

    fn next(&mut self) -> Option<&'t str> {
        let token = self.tokens.get(self.pos).copied();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&'t str> {
        self.tokens.get(self.pos).copied()
    }

    /// Tokens up to the next `;` at brace depth zero, consuming the `;`
    fn statement(&mut self) -> Vec<&'t str> {
        let mut depth = 0usize;
        let mut out = Vec::new();
        while let Some(token) = self.next() {
            match token {
                ";" if depth == 0 => break,
                "{" => depth += 1,
                "}" => depth = depth.saturating_sub(1),
                _ => {}
            }
            out.push(token);
        }
        out
    }

    fn parse_struct(&mut self) {
        let Some(name) = self.next() else { return };
        if self.peek() != Some("{") {
            return;
        }
        self.pos += 1;

        let mut fields = Vec::new();
        let mut decl: Vec<&str> = Vec::new();
        while let Some(token) = self.next() {
            match token {
                "}" => break,
                ";" => {
                    fields.extend(declarators(&decl));
                    decl.clear();
                }
                _ => decl.push(token),
            }
        }
        // Optional instance list after the closing brace is not a uniform
        self.statement();
        log::trace!("Shader struct {} with {} fields", name, fields.len());
        self.structs.insert(name.to_string(), fields);
    }

    fn parse_uniform(&mut self, interface: &mut ShaderInterface) {
        let statement = self.statement();
        if statement.contains(&"{") {
            return;
        }
        for (type_name, name) in declarators(&statement) {
            self.declare(interface, &type_name, &name, 0);
        }
    }

    fn declare(&self, interface: &mut ShaderInterface, type_name: &str, name: &str, depth: usize) {
        if let Some(param_type) = ParamType::from_glsl(type_name) {
            interface.params.insert(name.to_string(), param_type);
        } else if let Some(fields) = self.structs.get(type_name) {
            // Self-referential structs are invalid GLSL; bail out instead of recursing forever
            if depth > 8 {
                return;
            }
            for (field_type, field_name) in fields {
                let qualified = format!("{name}.{field_name}");
                self.declare(interface, field_type, &qualified, depth + 1);
            }
        } else {
            log::trace!("Skipping uniform {} of unsupported type {}", name, type_name);
        }
    }
}

/// Split `[qualifiers] type a, b[4], c` into `(type, name)` pairs
fn declarators(tokens: &[&str]) -> Vec<Field> {
    let mut rest = tokens.iter().copied().filter(|t| !QUALIFIERS.contains(t));
    let Some(type_name) = rest.next() else { return Vec::new() };

    let mut fields = Vec::new();
    let mut in_array = false;
    let mut expect_name = true;
    for token in rest {
        match token {
            "[" => in_array = true,
            "]" => in_array = false,
            "," if !in_array => expect_name = true,
            _ if in_array => {}
            _ if expect_name && is_identifier(token) => {
                fields.push((type_name.to_string(), token.to_string()));
                expect_name = false;
            }
            _ => {}
        }
    }
    fields
}

fn is_identifier(token: &str) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '/' && chars.peek() == Some(&'/') {
            for next in chars.by_ref() {
                if next == '\n' {
                    out.push('\n');
                    break;
                }
            }
        } else if c == '/' && chars.peek() == Some(&'*') {
            chars.next();
            let mut previous = '\0';
            for next in chars.by_ref() {
                if previous == '*' && next == '/' {
                    break;
                }
                if next == '\n' {
                    out.push('\n');
                }
                previous = next;
            }
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn strip_preprocessor(source: &str) -> String {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n")
}

fn tokenize(source: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in source.char_indices() {
        if c.is_ascii_alphanumeric() || c == '_' {
            start.get_or_insert(i);
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(&source[s..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&source[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&source[s..]);
    }
    tokens
}
