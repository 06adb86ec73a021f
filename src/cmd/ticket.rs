use crate::context::AppContext;
use crate::domain::event::Repository;
use crate::error::AppResult;
use crate::workflow::locator::{LocatedTicket, TicketLocator};

#[derive(Debug, Clone)]
pub struct TicketCommandArgs {
    pub repo: String,
    pub name: Option<String>,
    pub issue: u64,
}

impl TicketCommandArgs {
    fn repository(&self) -> Repository {
        let name = self.name.clone().unwrap_or_else(|| {
            self.repo
                .rsplit('/')
                .next()
                .unwrap_or(&self.repo)
                .to_string()
        });
        Repository {
            full_name: self.repo.clone(),
            name,
        }
    }
}

pub struct TicketLookupOutcome {
    pub field_name: Option<String>,
    pub tickets: Vec<LocatedTicket>,
}

pub async fn run(ctx: &AppContext, args: TicketCommandArgs) -> AppResult<TicketLookupOutcome> {
    let repository = args.repository();
    let locator = TicketLocator::new(ctx);
    let field_name = locator.custom_field_for(&repository).map(str::to_string);
    let tickets = locator.tickets_for_issue(args.issue, &repository).await?;
    Ok(TicketLookupOutcome {
        field_name,
        tickets,
    })
}
