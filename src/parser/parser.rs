use anyhow::bail;
use nalgebra::{Point3, Vector3};
use std::iter::Peekable;
use std::str::FromStr;

use super::{
    lexer::{Lexeme, Lexer, Range, Token},
    Error,
};
use crate::scene::{Primitive, Scene};

type Result<T> = std::result::Result<T, anyhow::Error>;

/// The blend radius used when a scene file does not pick one.
const DEFAULT_BLEND: f32 = 0.5;

/// Parse a scene description.
///
/// ```text
/// ; two spheres passing through each other
/// (blend 0.5)
/// (sphere :radius 0.1 :sway (0.35 0 0))
/// (sphere :radius 0.1 :center (0 0 0) :sway (-0.35 0 0))
/// ```
pub fn parse(input: &str) -> Result<Scene> {
    let mut parser = Parser::new(Lexer::new(input));
    parser.parse()?;
    Ok(parser.scene)
}

struct Parser<'a> {
    lexer: Peekable<Lexer<'a>>,
    scene: Scene,
}

impl<'a> Parser<'a> {
    fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer: lexer.peekable(),
            scene: Scene::empty(DEFAULT_BLEND),
        }
    }

    fn token(&mut self, expected: &'static str) -> Result<Lexeme> {
        match self.lexer.next() {
            Some(lexeme) if lexeme.token == Token::Error => bail!(Error::LexerError {
                text: lexeme.text,
                range: lexeme.range,
            }),
            Some(lexeme) => Ok(lexeme),
            None => bail!(Error::UnexpectedEof(expected)),
        }
    }

    fn guard(&mut self, token: Token, expected: &'static str) -> Result<Lexeme> {
        let tok = self.token(expected)?;
        if tok.token != token {
            bail!(Error::Unexpected {
                expected,
                found: tok.text,
                range: tok.range,
            })
        } else {
            Ok(tok)
        }
    }

    fn lparen(&mut self) -> Result<Range> {
        Ok(self.guard(Token::LParen, "`(`")?.range)
    }

    fn rparen(&mut self) -> Result<()> {
        self.guard(Token::RParen, "`)`")?;
        Ok(())
    }

    fn ident(&mut self) -> Result<Lexeme> {
        self.guard(Token::Ident, "an identifier")
    }

    fn number(&mut self) -> Result<f32> {
        let tok = self.guard(Token::Number, "a number")?;
        match f32::from_str(&tok.text) {
            Ok(num) => Ok(num),
            Err(_) => bail!(Error::Invalid {
                message: "malformed number",
                range: tok.range,
            }),
        }
    }

    fn vector(&mut self) -> Result<Vector3<f32>> {
        self.lparen()?;
        let x = self.number()?;
        let y = self.number()?;
        let z = self.number()?;
        self.rparen()?;
        Ok(Vector3::new(x, y, z))
    }

    fn peek_rparen(&mut self) -> bool {
        self.lexer
            .peek()
            .map_or(false, |tok| tok.token == Token::RParen)
    }

    /// Parse the body of `(sphere :radius r [:center (x y z)] [:sway (x y z)])`.
    fn parse_sphere(&mut self, start: Range) -> Result<Primitive> {
        let mut center = Point3::origin();
        let mut radius = None;
        let mut sway = Vector3::zeros();

        while !self.peek_rparen() {
            let field = self.guard(Token::Symbol, "a sphere field")?;
            match field.text.as_str() {
                ":radius" => {
                    let r = self.number()?;
                    if r <= 0. {
                        bail!(Error::Invalid {
                            message: "sphere radius must be positive",
                            range: field.range,
                        });
                    }
                    radius = Some(r);
                }
                ":center" => center = Point3::from(self.vector()?),
                ":sway" => sway = self.vector()?,
                _ => bail!(Error::Unexpected {
                    expected: "one of `:radius`, `:center` or `:sway`",
                    found: field.text,
                    range: field.range,
                }),
            }
        }

        match radius {
            Some(radius) => Ok(Primitive::swaying_sphere(center, radius, sway)),
            None => bail!(Error::Invalid {
                message: "sphere is missing a `:radius`",
                range: start,
            }),
        }
    }

    fn parse_command(&mut self) -> Result<()> {
        let start = self.lparen()?;
        let command = self.ident()?;

        match command.text.as_str() {
            "blend" => {
                let k = self.number()?;
                if k < 0. {
                    bail!(Error::Invalid {
                        message: "blend radius cannot be negative",
                        range: command.range,
                    });
                }
                self.scene.blend = k;
            }

            "sphere" => {
                let prim = self.parse_sphere(start)?;
                self.scene.primitives.push(prim);
            }

            _ => bail!(Error::Unexpected {
                expected: "`blend` or `sphere`",
                found: command.text,
                range: command.range,
            }),
        }

        self.rparen()?;

        Ok(())
    }

    fn parse(&mut self) -> Result<()> {
        while self.lexer.peek().is_some() {
            self.parse_command()?;
        }

        Ok(())
    }
}
