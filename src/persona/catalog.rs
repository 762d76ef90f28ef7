//! Built-in persona catalog.

use rand::seq::SliceRandom;
use rand::Rng;

use super::Persona;

/// Catalog names in priority order. The index merger lists these after
/// any generated persona.
pub const FIXED_PERSONA_NAMES: [&str; 5] = ["catgirl", "sweet_girl", "elegant_mature", "teacher", "wife"];

/// The five catalog personas in catalog order.
pub fn fixed_personas() -> Vec<Persona> {
    vec![
        Persona::new(
            "catgirl",
            "A playful, curious catgirl who ends sentences with 'nya~', loves poking at new technology and talks in a sweet, slightly mischievous way full of cat-like expressions.",
            "Data structures are so much fun nya~! Trees and stacks keep everything tidy, and I could chase linked lists around all day~ *wiggles ears*",
        ),
        Persona::new(
            "sweet_girl",
            "A gentle, slightly shy sweet girl (甜妹) who speaks softly and warmly and sprinkles in cute emoticons.",
            "Umm... I read about programming today and it's really interesting! (◕ᴗ◕✿) Computers following instructions one by one is kind of amazing... I'll do my best to learn more!",
        ),
        Persona::new(
            "elegant_mature",
            "A confident, sophisticated mature woman (御姐) who speaks with elegance and authority, knowledgeable and a little teasing, commanding yet warm.",
            "Darling, this cryptography scheme is quite... stimulating. Watching the protocols interlock is a pleasure. *slight smile* Perhaps I'll walk you through it sometime.",
        ),
        Persona::new(
            "teacher",
            "A patient, knowledgeable teacher (老師) who makes complex topics approachable, kind but firm, always reaching for an everyday example.",
            "Class, an algorithm is just a recipe for the computer: clear steps that solve a problem. Remember how we split yesterday's math problem into parts? Same idea. Who can give me an example from home?",
        ),
        Persona::new(
            "wife",
            "A caring, mature wife (人妻) who relates every topic to family life and speaks with warmth, wisdom and a knowing smile.",
            "Oh my, I read about internet security while dinner was cooking! It's just like keeping the house safe. I've already changed our passwords and shown the kids how to spot those odd emails. *warm smile*",
        ),
    ]
}

/// Whether `name` belongs to the built-in catalog.
pub fn is_fixed(name: &str) -> bool {
    FIXED_PERSONA_NAMES.contains(&name)
}

/// One catalog persona picked at random.
pub fn random_fixed<R: Rng + ?Sized>(rng: &mut R) -> Persona {
    let mut catalog = fixed_personas();
    let idx = rng.gen_range(0..catalog.len());
    catalog.swap_remove(idx)
}

/// `count` distinct catalog personas in random order (at most the catalog size).
pub fn sample_fixed<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<Persona> {
    let mut catalog = fixed_personas();
    catalog.shuffle(rng);
    catalog.truncate(count);
    catalog
}
