use anyhow::{anyhow, Result};
use serde::Serialize;
use std::io::{self, Write};
use tracing::error;

use crate::models::{BudgetItem, ExpenseItem, IncomeItem};
use crate::repository::{
    BudgetRecord, BudgetRepository, ExpenseRepository, ExpenseUpdate, IncomeRepository,
    Repository,
};
use crate::requests::{
    validate_budget, validate_income, AddExpensesRequest, ItemPath, ListQuery,
};

/// Record type a console command acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Income,
    Budget,
    Expense,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Add,
    List,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Record(RecordKind, Action),
    Help,
    Exit,
}

/// Parses `<income|budget|expense> <add|list|update|delete>`, `help` or `exit`.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let first = words.next()?;
    let command = match first {
        "exit" | "quit" => Command::Exit,
        "help" => Command::Help,
        _ => {
            let kind = match first {
                "income" => RecordKind::Income,
                "budget" => RecordKind::Budget,
                "expense" | "expenses" => RecordKind::Expense,
                _ => return None,
            };
            let action = match words.next()? {
                "add" => Action::Add,
                "list" => Action::List,
                "update" => Action::Update,
                "delete" => Action::Delete,
                _ => return None,
            };
            Command::Record(kind, action)
        }
    };
    if words.next().is_some() {
        return None;
    }
    Some(command)
}

/// Splits a comma separated tag list, dropping blanks.
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

const HELP: &str = "Commands:
  income  add|list|update|delete
  budget  add|list|update|delete
  expense add|list|update|delete
  help
  exit";

/// Interactive console over the three record repositories.
pub struct Console {
    income: IncomeRepository,
    budget: BudgetRepository,
    expenses: ExpenseRepository,
}

impl Console {
    pub fn new(
        income: IncomeRepository,
        budget: BudgetRepository,
        expenses: ExpenseRepository,
    ) -> Self {
        Self {
            income,
            budget,
            expenses,
        }
    }

    /// Runs the command loop until `exit` or end of input.
    ///
    /// A failing command is reported and the loop continues; only terminal I/O
    /// errors end it early.
    pub async fn run(&self) -> Result<()> {
        println!("{HELP}");
        loop {
            let Some(line) = read_line("budget> ")? else {
                break;
            };
            if line.is_empty() {
                continue;
            }
            let outcome = match parse_command(&line) {
                Some(Command::Exit) => break,
                Some(Command::Help) => {
                    println!("{HELP}");
                    Ok(())
                }
                Some(Command::Record(kind, action)) => self.execute(kind, action).await,
                None => {
                    println!("Unknown command. Type 'help' for the list of commands.");
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                error!("Command '{line}' failed: {e}");
                println!("Error: {e}");
            }
        }
        Ok(())
    }

    async fn execute(&self, kind: RecordKind, action: Action) -> Result<()> {
        match (kind, action) {
            (RecordKind::Income, Action::Add) => add_income(&self.income).await,
            (RecordKind::Budget, Action::Add) => add_budget(&self.budget).await,
            (RecordKind::Expense, Action::Add) => add_expenses(&self.expenses).await,
            (RecordKind::Income, Action::List) => list(&self.income).await,
            (RecordKind::Budget, Action::List) => list(&self.budget).await,
            (RecordKind::Expense, Action::List) => list(&self.expenses).await,
            (RecordKind::Income, Action::Update) => {
                let path = prompt_path("incomeItemName")?;
                let value = prompt_number("New value")?;
                self.income
                    .update(&path.user_id, &path.month, &path.name, value)
                    .await?;
                println!("Income item updated successfully");
                Ok(())
            }
            (RecordKind::Budget, Action::Update) => {
                let path = prompt_path("budgetItemName")?;
                let value = prompt_number("New value")?;
                self.budget
                    .update(&path.user_id, &path.month, &path.name, value)
                    .await?;
                println!("Budget item updated successfully");
                Ok(())
            }
            (RecordKind::Expense, Action::Update) => {
                let path = prompt_path("expenseItemName")?;
                let value = prompt_number("New value")?;
                let tags = parse_tags(&prompt("New tags (comma separated)", Some("food,weekly"))?);
                self.expenses
                    .update(
                        &path.user_id,
                        &path.month,
                        &path.name,
                        ExpenseUpdate { value, tags },
                    )
                    .await?;
                println!("Expense item updated successfully");
                Ok(())
            }
            (RecordKind::Income, Action::Delete) => delete(&self.income, "incomeItemName").await,
            (RecordKind::Budget, Action::Delete) => delete(&self.budget, "budgetItemName").await,
            (RecordKind::Expense, Action::Delete) => {
                delete(&self.expenses, "expenseItemName").await
            }
        }
    }
}

async fn add_income(repo: &IncomeRepository) -> Result<()> {
    let item = IncomeItem {
        user_id: prompt("userId", None)?,
        month: prompt("month", Some("2024-01"))?,
        income_item_name: prompt("incomeItemName", Some("salary"))?,
        income_item_value: prompt_number("incomeItemValue")?,
    };
    validate_income(&item)?;
    repo.add(&item).await?;
    println!("Income added successfully");
    Ok(())
}

async fn add_budget(repo: &BudgetRepository) -> Result<()> {
    let item = BudgetItem {
        user_id: prompt("userId", None)?,
        month: prompt("month", Some("2024-01"))?,
        budget_item_name: prompt("budgetItemName", Some("rent"))?,
        budget_item_value: prompt_number("budgetItemValue")?,
    };
    validate_budget(&item)?;
    repo.add(&item).await?;
    println!("Budget item added successfully");
    Ok(())
}

/// Collects expenses until an empty name is entered, then writes them as one batch.
async fn add_expenses(repo: &ExpenseRepository) -> Result<()> {
    let user_id = prompt("userId", None)?;
    let month = prompt("month", Some("2024-01"))?;
    let mut expenses = Vec::new();
    loop {
        let name = prompt("expenseItemName (empty to finish)", Some("groceries"))?;
        if name.is_empty() {
            break;
        }
        expenses.push(ExpenseItem {
            user_id: user_id.clone(),
            expense_item_name: name,
            month: month.clone(),
            expense_value: prompt_number("expenseItemValue")?,
            expense_tags: parse_tags(&prompt("expenseTags (comma separated)", Some("food"))?),
        });
    }

    let request = AddExpensesRequest { expenses };
    request.validate()?;
    let summary = repo.add_batch(&request.expenses).await?;
    println!(
        "{} expense(s) added successfully in {} batch request(s)",
        summary.items, summary.chunks
    );
    Ok(())
}

async fn list<T: BudgetRecord>(repo: &Repository<T>) -> Result<()> {
    let query = ListQuery {
        user_id: prompt("userId", None)?,
        month: prompt("month", Some("2024-01"))?,
    };
    query.validate()?;
    let items = repo.get_all(&query.user_id, &query.month).await?;
    print_items(repo.table().name(), &items)
}

async fn delete<T: BudgetRecord>(repo: &Repository<T>, name_field: &str) -> Result<()> {
    let path = prompt_path(name_field)?;
    repo.delete(&path.user_id, &path.month, &path.name).await?;
    println!("Item deleted successfully");
    Ok(())
}

fn print_items<T: Serialize>(title: &str, items: &[T]) -> Result<()> {
    println!("\n--- {} ({} items) ---", title, items.len());
    for item in items {
        println!("{}", serde_json::to_string(item)?);
    }
    println!("-------------------------\n");
    Ok(())
}

fn prompt_path(name_field: &str) -> Result<ItemPath> {
    let path = ItemPath::new(
        prompt("userId", None)?,
        prompt("month", Some("2024-01"))?,
        prompt(name_field, None)?,
    );
    path.validate()?;
    Ok(path)
}

fn prompt_number(message: &str) -> Result<f64> {
    parse_number(&prompt(message, Some("42.5"))?)
}

/// Finite numbers only; `f64` parsing alone would accept `nan` and `inf`.
fn parse_number(input: &str) -> Result<f64> {
    match input.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(anyhow!("'{input}' is not a number")),
    }
}

/// Prompts the user for input and returns the trimmed line.
fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    read_line(&full_message)?.ok_or_else(|| anyhow!("input closed"))
}

/// `None` on end of input.
fn read_line(message: &str) -> Result<Option<String>> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}
