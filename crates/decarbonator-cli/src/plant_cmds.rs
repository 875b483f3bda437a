//! Operator CLI handlers for `decarbonator plant` subcommands.
//!
//! Implements:
//! - `decarbonator plant add`            -- create a plant
//! - `decarbonator plant list`           -- list all plants
//! - `decarbonator plant show <id>`      -- show one plant
//! - `decarbonator plant update <id>`    -- partially update a plant
//! - `decarbonator plant remove <id>`    -- delete a plant

use anyhow::Result;

use decarbonator_core::PlantService;
use decarbonator_db::models::{NewPlant, Plant, PlantUpdate};

use crate::PlantCommands;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlantCommands` variant to the appropriate handler.
pub async fn run_plant_command(command: PlantCommands, service: &PlantService) -> Result<()> {
    match command {
        PlantCommands::Add {
            name,
            species,
            fields,
        } => {
            let input = NewPlant {
                status: fields.status,
                health: fields.health,
                water: fields.water,
                image: fields.image,
                age_months: fields.age_months,
                ..NewPlant::new(name, species)
            };
            let plant = service.create(input).await?;
            println!("Plant created.");
            println!();
            print_plant(&plant);
        }
        PlantCommands::List => cmd_list(service).await?,
        PlantCommands::Show { plant_id } => {
            let plant = service.get(&plant_id).await?;
            print_plant(&plant);
        }
        PlantCommands::Update {
            plant_id,
            name,
            species,
            fields,
        } => {
            let update = PlantUpdate {
                name,
                species,
                status: fields.status,
                health: fields.health,
                water: fields.water,
                image: fields.image,
                age_months: fields.age_months,
            };
            if update.is_empty() {
                println!("No fields given; only updated_at will change.");
            }
            let plant = service.update(&plant_id, update).await?;
            println!("Plant updated.");
            println!();
            print_plant(&plant);
        }
        PlantCommands::Remove { plant_id } => {
            let confirmation = service.delete(&plant_id).await?;
            println!("{} ({})", confirmation.message, confirmation.id);
        }
    }
    Ok(())
}

// -----------------------------------------------------------------------
// decarbonator plant list
// -----------------------------------------------------------------------

async fn cmd_list(service: &PlantService) -> Result<()> {
    let plants = service.list_all().await?;

    if plants.is_empty() {
        println!("No plants found. Use `decarbonator plant add` to create one.");
        return Ok(());
    }

    print!("{}", format_table(&plants));
    println!();
    println!("{} plant(s)", plants.len());
    Ok(())
}

/// Render plants as a fixed-width table: ID, name, species, status, health.
fn format_table(plants: &[Plant]) -> String {
    // ObjectId hex is always 24 chars.
    let id_w = 24;
    let name_w = column_width(plants.iter().map(|p| p.name.as_str()), "NAME");
    let species_w = column_width(plants.iter().map(|p| p.species.as_str()), "SPECIES");
    let status_w = column_width(plants.iter().map(|p| p.status.as_str()), "STATUS");

    let mut out = format!(
        "{:<id_w$}  {:<name_w$}  {:<species_w$}  {:<status_w$}  HEALTH\n",
        "ID", "NAME", "SPECIES", "STATUS"
    );
    for p in plants {
        out.push_str(&format!(
            "{:<id_w$}  {:<name_w$}  {:<species_w$}  {:<status_w$}  {}\n",
            p.id.to_string(),
            p.name,
            p.species,
            p.status,
            p.health
        ));
    }
    out
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

fn print_plant(plant: &Plant) {
    println!("  ID:          {}", plant.id);
    println!("  Name:        {}", plant.name);
    println!("  Species:     {}", plant.species);
    println!("  Status:      {}", plant.status);
    println!("  Health:      {}", plant.health);
    println!("  Water:       {}", plant.water);
    println!("  Image:       {}", plant.image);
    println!("  Age:         {} month(s)", plant.age_months);
    println!("  Created:     {}", plant.created_at.to_rfc3339());
    println!("  Updated:     {}", plant.updated_at.to_rfc3339());
}
