/// STL decoder for binary and ASCII formats
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    combinator::opt,
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};
use crate::geometry::{Mesh, Triangle, Vertex};

const HEADER_LEN: usize = 80;
const FACET_LEN: usize = 50;

/// Size a binary STL with `triangles` facets must have
pub fn binary_len(triangles: usize) -> usize {
    HEADER_LEN + 4 + FACET_LEN * triangles
}

/// Detect and parse STL data (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh> {
    if is_exact_binary(data) {
        return parse_binary_stl(data);
    }

    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    if data[start..].starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            return parse_ascii_stl(text);
        }
    }

    parse_binary_stl(data)
}

fn is_exact_binary(data: &[u8]) -> bool {
    match data.get(HEADER_LEN..HEADER_LEN + 4) {
        Some(&[a, b, c, d]) => {
            let declared = u32::from_le_bytes([a, b, c, d]) as usize;
            declared
                .checked_mul(FACET_LEN)
                .and_then(|n| n.checked_add(HEADER_LEN + 4))
                == Some(data.len())
        }
        _ => false,
    }
}

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh> {
    if data.len() < binary_len(0) {
        return Err(Error::TruncatedStl {
            expected: binary_len(0),
            actual: data.len(),
        });
    }

    let declared = u32::from_le_bytes([data[80], data[81], data[82], data[83]]) as usize;
    let expected = declared.saturating_mul(FACET_LEN).saturating_add(binary_len(0));
    if data.len() < expected {
        return Err(Error::TruncatedStl {
            expected,
            actual: data.len(),
        });
    }

    match binary_body(data) {
        Ok((_, mesh)) => Ok(mesh),
        Err(_) => Err(Error::TruncatedStl {
            expected,
            actual: data.len(),
        }),
    }
}

fn binary_body(input: &[u8]) -> IResult<&[u8], Mesh> {
    let (input, _header) = take(HEADER_LEN)(input)?;
    let (input, facets) = le_u32(input)?;
    let (input, triangles) = count(binary_facet, facets as usize)(input)?;
    Ok((input, Mesh { triangles }))
}

fn binary_facet(input: &[u8]) -> IResult<&[u8], Triangle> {
    let (input, (normal, a, b, c, _attributes)) =
        tuple((le_vec3, le_vec3, le_vec3, le_vec3, le_u16))(input)?;
    Ok((input, facet(normal, [a, b, c])))
}

fn le_vec3(input: &[u8]) -> IResult<&[u8], [f32; 3]> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [x, y, z]))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh> {
    match ascii_solid(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = input.len() - e.input.len();
            let line = input[..offset].matches('\n').count() + 1;
            Err(Error::StlSyntax(format!("unexpected input at line {}", line)))
        }
        Err(nom::Err::Incomplete(_)) => Err(Error::StlSyntax("incomplete input".to_string())),
    }
}

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    preceded(multispace0, tag(word))
}

fn ascii_solid(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = keyword("solid")(input)?;
    let (input, _name) = not_line_ending(input)?;
    let (input, triangles) = many0(ascii_facet)(input)?;
    let (input, _) = keyword("endsolid")(input)?;
    let (input, _) = opt(not_line_ending)(input)?;
    Ok((input, Mesh { triangles }))
}

fn ascii_facet(input: &str) -> IResult<&str, Triangle> {
    let (input, _) = keyword("facet")(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, normal) = ascii_vec3(input)?;
    let (input, _) = keyword("outer")(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, a) = preceded(keyword("vertex"), ascii_vec3)(input)?;
    let (input, b) = preceded(keyword("vertex"), ascii_vec3)(input)?;
    let (input, c) = preceded(keyword("vertex"), ascii_vec3)(input)?;
    let (input, _) = keyword("endloop")(input)?;
    let (input, _) = keyword("endfacet")(input)?;
    Ok((input, facet(normal, [a, b, c])))
}

fn ascii_vec3(input: &str) -> IResult<&str, [f32; 3]> {
    let (input, (x, y, z)) = tuple((
        preceded(multispace1, float),
        preceded(multispace1, float),
        preceded(multispace1, float),
    ))(input)?;
    Ok((input, [x, y, z]))
}

/// Build a facet; a zero stored normal is replaced by the winding normal
fn facet([nx, ny, nz]: [f32; 3], corners: [[f32; 3]; 3]) -> Triangle {
    let vertices = corners.map(|[x, y, z]| Vertex::new(x, y, z, nx, ny, nz));
    let mut triangle = Triangle { vertices };
    if nx == 0.0 && ny == 0.0 && nz == 0.0 {
        let normal = triangle.calculate_normal();
        for v in &mut triangle.vertices {
            v.normal = normal;
        }
    }
    triangle
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn binary_with(triangles: &[[[f32; 3]; 4]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for facet in triangles {
            for vector in facet {
                for component in vector {
                    data.extend_from_slice(&component.to_le_bytes());
                }
            }
            data.extend_from_slice(&0u16.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let data = binary_with(&[]);
        let mesh = parse_binary_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 0);
    }

    #[test]
    fn test_parse_binary_facet() {
        let data = binary_with(&[[
            [0.0, 0.0, 1.0],
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
        ]]);
        assert_eq!(data.len(), binary_len(1));

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        let t = &mesh.triangles[0];
        assert_eq!(t.vertices[1].position.x, 1.0);
        assert_eq!(t.vertices[2].normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_binary_header_starting_with_solid() {
        // exporters often write "solid" into the binary header
        let mut data = binary_with(&[[[0.0; 3], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data[..5].copy_from_slice(b"solid");
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        // zero normal replaced by winding normal
        assert!((mesh.triangles[0].vertices[0].normal - Vector3::z()).norm() < 1e-6);
    }

    #[test]
    fn test_truncated_binary() {
        let mut data = binary_with(&[]);
        data[80..84].copy_from_slice(&3u32.to_le_bytes());
        match parse_binary_stl(&data) {
            Err(Error::TruncatedStl { expected, actual }) => {
                assert_eq!(expected, binary_len(3));
                assert_eq!(actual, 84);
            }
            other => panic!("expected truncation error, got {:?}", other),
        }
        assert!(matches!(parse_stl(&[0u8; 10]), Err(Error::TruncatedStl { .. })));
    }

    #[test]
    fn test_parse_ascii() {
        let text = "solid desk\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1.5e0 0 0\n\
                vertex 0 -2.25 0\n\
              endloop\n\
            endfacet\n\
            endsolid desk\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.triangles.len(), 1);
        assert_eq!(mesh.triangles[0].vertices[1].position.x, 1.5);
        assert_eq!(mesh.triangles[0].vertices[2].position.y, -2.25);
    }

    #[test]
    fn test_ascii_syntax_error_reports_line() {
        let text = "solid broken\nfacet normal 0 0 1\n  outer loop\n    vertex 0 0\nendsolid\n";
        match parse_ascii_stl(text) {
            Err(Error::StlSyntax(message)) => assert!(message.contains("line")),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
