//! Canonical Liga MX registry loaded into the store at boot.

use super::models::NewTeam;

/// (name, nickname, slug, primary, secondary, stadium, city, logo)
type TeamRow = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    &'static str,
);

const LIGA_MX_TEAMS: [TeamRow; 18] = [
    ("Club América", "Las Águilas", "america", "#FFD700", "#003366", "Estadio Azteca", "Ciudad de México", "https://logoeps.com/wp-content/uploads/2013/03/club-america-vector-logo.png"),
    ("Chivas Guadalajara", "El Rebaño", "chivas", "#E50022", "#FFFFFF", "Estadio Akron", "Guadalajara", "https://logoeps.com/wp-content/uploads/2013/03/chivas-vector-logo.png"),
    ("Cruz Azul", "La Máquina", "cruz-azul", "#1F4E79", "#FFFFFF", "Estadio Ciudad de los Deportes", "Ciudad de México", "https://logoeps.com/wp-content/uploads/2013/03/cruz-azul-vector-logo.png"),
    ("Pumas UNAM", "Los Pumas", "pumas", "#003366", "#FFD700", "Estadio Olímpico Universitario", "Ciudad de México", "https://logoeps.com/wp-content/uploads/2013/03/pumas-unam-vector-logo.png"),
    ("Tigres UANL", "Los Tigres", "tigres", "#FFB300", "#003366", "Estadio Universitario", "Monterrey", "https://logoeps.com/wp-content/uploads/2013/03/tigres-uanl-vector-logo.png"),
    ("CF Monterrey", "Los Rayados", "monterrey", "#003366", "#FFFFFF", "Estadio BBVA", "Monterrey", "https://logoeps.com/wp-content/uploads/2013/03/monterrey-vector-logo.png"),
    ("Santos Laguna", "Los Guerreros", "santos", "#00A651", "#FFFFFF", "Estadio Corona", "Torreón", "https://logoeps.com/wp-content/uploads/2013/03/santos-laguna-vector-logo.png"),
    ("Club León", "La Fiera", "leon", "#00A651", "#FFD700", "Estadio León", "León", "https://logoeps.com/wp-content/uploads/2013/03/leon-vector-logo.png"),
    ("FC Juárez", "Los Bravos", "juarez", "#E50022", "#000000", "Estadio Olímpico Benito Juárez", "Ciudad Juárez", "https://upload.wikimedia.org/wikipedia/commons/thumb/6/6c/FC_Ju%C3%A1rez_logo.svg/1200px-FC_Ju%C3%A1rez_logo.svg.png"),
    ("Atlas FC", "Los Zorros", "atlas", "#E50022", "#000000", "Estadio Jalisco", "Guadalajara", "https://logoeps.com/wp-content/uploads/2013/03/atlas-vector-logo.png"),
    ("CF Pachuca", "Los Tuzos", "pachuca", "#1F4E79", "#FFFFFF", "Estadio Hidalgo", "Pachuca", "https://logoeps.com/wp-content/uploads/2013/03/pachuca-vector-logo.png"),
    ("Deportivo Toluca", "Los Diablos Rojos", "toluca", "#E50022", "#FFFFFF", "Estadio Nemesio Díez", "Toluca", "https://logoeps.com/wp-content/uploads/2013/03/toluca-vector-logo.png"),
    ("Mazatlán FC", "Los Cañoneros", "mazatlan", "#8B008B", "#FFD700", "Estadio El Encanto", "Mazatlán", "https://upload.wikimedia.org/wikipedia/commons/thumb/c/c4/Mazatl%C3%A1n_FC_logo.svg/1200px-Mazatl%C3%A1n_FC_logo.svg.png"),
    ("Club Puebla", "La Franja", "puebla", "#1F4E79", "#FFFFFF", "Estadio Cuauhtémoc", "Puebla", "https://logoeps.com/wp-content/uploads/2013/03/puebla-vector-logo.png"),
    ("Querétaro FC", "Los Gallos Blancos", "queretaro", "#000000", "#1F4E79", "Estadio La Corregidora", "Querétaro", "https://logoeps.com/wp-content/uploads/2013/03/queretaro-vector-logo.png"),
    ("Club Tijuana", "Los Xolos", "tijuana", "#E50022", "#000000", "Estadio Caliente", "Tijuana", "https://logoeps.com/wp-content/uploads/2013/03/tijuana-vector-logo.png"),
    ("Necaxa", "Los Rayos", "necaxa", "#E50022", "#FFFFFF", "Estadio Victoria", "Aguascalientes", "https://logoeps.com/wp-content/uploads/2013/03/necaxa-vector-logo.png"),
    ("Atlético de San Luis", "Los Potosinos", "atletico-san-luis", "#FF0000", "#FFFFFF", "Estadio Alfonso Lastras", "San Luis Potosí", "https://upload.wikimedia.org/wikipedia/commons/thumb/9/9a/Atletico_San_Luis_logo.svg/1200px-Atletico_San_Luis_logo.svg.png"),
];

pub fn liga_mx_teams() -> Vec<NewTeam> {
    LIGA_MX_TEAMS
        .iter()
        .map(
            |&(name, nickname, slug, primary, secondary, stadium, city, logo)| NewTeam {
                name: name.to_string(),
                nickname: nickname.to_string(),
                slug: slug.to_string(),
                primary_color: primary.to_string(),
                secondary_color: secondary.to_string(),
                logo: Some(logo.to_string()),
                stadium: Some(stadium.to_string()),
                city: Some(city.to_string()),
            },
        )
        .collect()
}
